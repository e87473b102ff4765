use rdpwn_gfx::{Canvas, PassthroughCodec, PixelBlock, Rgb, TileDecoder, TileUpdate};

fn solid_update(left: u32, top: u32, width: u32, height: u32, rgb565: u16) -> TileUpdate {
    let mut data = Vec::with_capacity(width as usize * height as usize * 2);
    for _ in 0..width * height {
        data.extend_from_slice(&rgb565.to_le_bytes());
    }
    TileUpdate {
        left,
        top,
        right: left + width - 1,
        bottom: top + height - 1,
        width,
        height,
        bits_per_pixel: 16,
        compressed: false,
        data,
    }
}

#[test]
fn overlapping_updates_resolve_last_write_wins() {
    let decoder = TileDecoder::new(PassthroughCodec);
    let mut canvas = Canvas::new(8, 8);
    let updates = [
        solid_update(0, 0, 6, 6, 0xffff),
        solid_update(2, 2, 6, 6, 0xf800),
        solid_update(4, 0, 2, 8, 0x0000),
    ];
    for update in &updates {
        decoder.apply(update, &mut canvas).expect("apply update");
    }

    let red = Rgb::new(255, 0, 0);
    let mut expected = Canvas::new(8, 8);
    expected
        .paste_block(&PixelBlock::filled(6, 6, Rgb::WHITE), 0, 0)
        .expect("paste white");
    expected
        .paste_block(&PixelBlock::filled(6, 6, red), 2, 2)
        .expect("paste red");
    expected
        .paste_block(&PixelBlock::filled(2, 8, Rgb::BLACK), 4, 0)
        .expect("paste black");
    assert_eq!(canvas, expected);

    for y in 0..8 {
        for x in 0..8 {
            let want = if (4..6).contains(&x) {
                Rgb::BLACK
            } else if x >= 2 && y >= 2 {
                red
            } else if x < 6 && y < 6 {
                Rgb::WHITE
            } else {
                Rgb::BLACK
            };
            assert_eq!(canvas.pixel(x, y), Some(want), "pixel ({x}, {y})");
        }
    }
}

#[test]
fn color_counts_survive_copy() {
    let decoder = TileDecoder::new(PassthroughCodec);
    let mut canvas = Canvas::new(16, 9);
    decoder
        .apply(&solid_update(3, 1, 5, 4, 0xffff), &mut canvas)
        .expect("apply white");
    decoder
        .apply(&solid_update(10, 5, 6, 4, 0x8410), &mut canvas)
        .expect("apply gray");

    let snapshot = canvas.copy();
    for color in [Rgb::BLACK, Rgb::WHITE, Rgb::new(131, 129, 131)] {
        assert_eq!(canvas.count_color(color), snapshot.count_color(color));
    }
    assert_eq!(snapshot.count_color(Rgb::WHITE), 20);
    assert_eq!(snapshot.count_color(Rgb::new(131, 129, 131)), 24);
    assert_eq!(snapshot.count_color(Rgb::BLACK), 16 * 9 - 44);
}
