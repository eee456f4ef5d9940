use tiny_skia::Pixmap;

use crate::error::{Error, Result};

/// Encode a rendered frame as PNG (straight alpha, as PNG requires).
pub fn encode_png(image: &Pixmap) -> Result<Vec<u8>> {
    image
        .encode_png()
        .map_err(|e| Error::Render(format!("PNG encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    #[test]
    fn round_trips_dimensions_and_pixels() {
        let mut pixmap = Pixmap::new(3, 2).unwrap();
        pixmap.fill(Color::from_rgba8(10, 20, 30, 255));
        let png = encode_png(&pixmap).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = Pixmap::decode_png(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        assert_eq!(decoded.data(), pixmap.data());
    }
}
