//! QR payload rendering
//!
//! Encodes the session payload as an SVG QR code wrapped in a data URI so
//! the login page can inline it without any asset pipeline.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use qrcode::render::svg;
use qrcode::{QrCode, types::QrError};

pub fn svg_data_uri(payload: &str) -> Result<String, QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(240, 240)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    Ok(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_renders_to_svg_data_uri() {
        let uri = svg_data_uri(r#"{"session_id":"abc"}"#).unwrap();
        let encoded = uri.strip_prefix("data:image/svg+xml;base64,").unwrap();

        let svg_bytes = STANDARD.decode(encoded).unwrap();
        let svg_text = String::from_utf8(svg_bytes).unwrap();
        assert!(svg_text.contains("<svg"));
    }
}
