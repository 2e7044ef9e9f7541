//! Synthetic card photos for detector and analyzer tests.
use image::{ImageBuffer, Rgb, RgbImage};

use crate::pipeline::types::{ChannelLayout, RawImage};

pub const CARD_WIDTH: u32 = 250;
pub const CARD_HEIGHT: u32 = 350;

const BORDER: Rgb<u8> = Rgb([230, 200, 40]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy)]
pub struct CardLayout {
    pub left_border: u32,
    pub right_border: u32,
    pub top_border: u32,
    pub bottom_border: u32,
    pub whitened_corners: bool,
    pub nicked_edges: bool,
    pub scratches: u32,
}

impl CardLayout {
    pub fn pristine() -> Self {
        Self {
            left_border: 20,
            right_border: 20,
            top_border: 20,
            bottom_border: 20,
            whitened_corners: false,
            nicked_edges: false,
            scratches: 0,
        }
    }

    pub fn worn() -> Self {
        Self {
            left_border: 10,
            right_border: 30,
            whitened_corners: true,
            nicked_edges: true,
            scratches: 12,
            ..Self::pristine()
        }
    }
}

pub fn synthetic_card(layout: CardLayout) -> RawImage {
    let (w, h) = (CARD_WIDTH, CARD_HEIGHT);
    let art_x1 = w - layout.right_border;
    let art_y1 = h - layout.bottom_border;

    let mut card: RgbImage = ImageBuffer::from_fn(w, h, |x, y| {
        let in_art =
            x >= layout.left_border && x < art_x1 && y >= layout.top_border && y < art_y1;
        if in_art {
            // gentle gradient, far from the border color
            Rgb([
                (40 + x * 20 / w) as u8,
                (90 + y * 20 / h) as u8,
                200,
            ])
        } else {
            BORDER
        }
    });

    let corner = (w.min(h) / 16).max(2);
    let strip = (w.min(h) / 40).max(1);

    if layout.whitened_corners {
        for (cx, cy) in [(0, 0), (w - corner, 0), (0, h - corner), (w - corner, h - corner)] {
            for y in cy..cy + corner {
                for x in cx..cx + corner {
                    card.put_pixel(x, y, WHITE);
                }
            }
        }
    }

    if layout.nicked_edges {
        for x in corner..w - corner {
            if x % 10 < 3 {
                for y in (0..strip).chain(h - strip..h) {
                    card.put_pixel(x, y, WHITE);
                }
            }
        }
        for y in corner..h - corner {
            if y % 10 < 3 {
                for x in (0..strip).chain(w - strip..w) {
                    card.put_pixel(x, y, WHITE);
                }
            }
        }
    }

    for i in 0..layout.scratches {
        let mut x = layout.left_border + 10 + (i * 7) % 60;
        let mut y = layout.top_border + 10 + i * 12;
        for _ in 0..140 {
            if x + 4 >= art_x1 || y + 4 >= art_y1 {
                break;
            }
            card.put_pixel(x, y, WHITE);
            x += 1;
            y += 1;
        }
    }

    RawImage::from_raw(w, h, ChannelLayout::Rgb, card.into_raw())
}
