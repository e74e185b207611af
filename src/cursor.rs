use std::{fs::File, io::Read};

use tracing::warn;
use xcursor::{
    CursorTheme,
    parser::{Image, parse_xcursor},
};

/// Side of the on-screen cursor box.
pub const CURSOR_BOX_SIZE: i32 = 16;

/// Pointer image as straight RGBA rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorImage {
    pub width: u32,
    pub height: u32,
    pub xhot: u32,
    pub yhot: u32,
    pub pixels_rgba: Vec<u8>,
}

impl CursorImage {
    /// The `default` cursor of `theme` closest to `size`, or the built-in
    /// arrow when the theme cannot be read.
    pub fn load(theme: &str, size: u32) -> Self {
        let theme = CursorTheme::load(theme);
        match load_default_cursor(&theme) {
            Ok(images) => nearest_image(size, &images)
                .map(Self::from_xcursor)
                .unwrap_or_else(Self::fallback_arrow),
            Err(err) => {
                warn!("Unable to load xcursor theme ({err}), using fallback cursor");
                Self::fallback_arrow()
            }
        }
    }

    fn from_xcursor(image: &Image) -> Self {
        Self {
            width: image.width,
            height: image.height,
            xhot: image.xhot,
            yhot: image.yhot,
            pixels_rgba: image.pixels_rgba.clone(),
        }
    }

    /// 16x16 arrow, white fill with a black outline.
    pub fn fallback_arrow() -> Self {
        const ARROW: [&str; 16] = [
            "B...............",
            "BB..............",
            "BWB.............",
            "BWWB............",
            "BWWWB...........",
            "BWWWWB..........",
            "BWWWWWB.........",
            "BWWWWWWB........",
            "BWWWWWWWB.......",
            "BWWWWWBBBB......",
            "BWWBWWB.........",
            "BWB.BWWB........",
            "BB..BWWB........",
            "B....BWWB.......",
            ".....BWB........",
            "......BB........",
        ];

        let pixels_rgba = ARROW
            .iter()
            .flat_map(|row| row.bytes())
            .flat_map(|cell| match cell {
                b'B' => [0, 0, 0, 255],
                b'W' => [255, 255, 255, 255],
                _ => [0, 0, 0, 0],
            })
            .collect();

        Self {
            width: 16,
            height: 16,
            xhot: 0,
            yhot: 0,
            pixels_rgba,
        }
    }

    /// Hotspot in cursor-box pixels.
    pub fn box_hotspot(&self) -> (i32, i32) {
        let scale = |hot: u32, extent: u32| {
            if extent == 0 {
                0
            } else {
                (hot as i64 * CURSOR_BOX_SIZE as i64 / extent as i64) as i32
            }
        };
        (scale(self.xhot, self.width), scale(self.yhot, self.height))
    }
}

fn load_default_cursor(theme: &CursorTheme) -> Result<Vec<Image>, String> {
    let path = theme
        .load_icon("default")
        .or_else(|| theme.load_icon("left_ptr"))
        .ok_or_else(|| "theme has no `default` cursor".to_owned())?;

    let mut file = File::open(path).map_err(|err| format!("failed to open cursor file: {err}"))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .map_err(|err| format!("failed to read cursor file: {err}"))?;

    parse_xcursor(&data).ok_or_else(|| "failed to parse cursor data".to_owned())
}

/// First frame of the image set whose nominal size is closest to `size`.
fn nearest_image(size: u32, images: &[Image]) -> Option<&Image> {
    images
        .iter()
        .min_by_key(|image| (size as i64 - image.size as i64).abs())
}
