//! Renders payment QR codes. The payload is a plain `cashless:<user id>:<name>` string that the
//! client apps parse to prefill a payment; the raster is a PNG shipped to the client as base64.

use std::io::Cursor;

use base64::Engine;
use image::{GrayImage, Luma};
use qrcode::{types::QrError, Color, QrCode};
use thiserror::Error;

use crate::user;

// Pixels per module and quiet-zone width, in modules.
const SCALE: u32 = 10;
const BORDER: u32 = 5;

const PAYLOAD_SCHEME: &str = "cashless";

#[derive(Debug, Error)]
#[error("failed to encode QR payload")]
pub struct EncodeError(#[from] QrError);

#[derive(Debug)]
pub struct PaymentCode {
    pub data: String,
    /// Base64-encoded PNG.
    pub image: String,
}

pub fn payment_code(user: &user::User) -> Result<PaymentCode, EncodeError> {
    let data = payload(user);
    let code = QrCode::new(data.as_bytes())?;
    let png = render_png(&code);
    Ok(PaymentCode {
        data,
        image: base64::engine::general_purpose::STANDARD.encode(png),
    })
}

fn payload(user: &user::User) -> String {
    format!("{}:{}:{}", PAYLOAD_SCHEME, user.id.0, user.name)
}

fn render_png(code: &QrCode) -> Vec<u8> {
    let width = code.width() as u32;
    let colors = code.to_colors();
    let size = (width + 2 * BORDER) * SCALE;
    let mut img = GrayImage::from_pixel(size, size, Luma([255]));
    for y in 0..width {
        for x in 0..width {
            if colors[(y * width + x) as usize] == Color::Dark {
                for dy in 0..SCALE {
                    for dx in 0..SCALE {
                        img.put_pixel(
                            (x + BORDER) * SCALE + dx,
                            (y + BORDER) * SCALE + dy,
                            Luma([0]),
                        );
                    }
                }
            }
        }
    }
    let mut png = Cursor::new(Vec::new());
    // Writing PNG to memory cannot fail.
    img.write_to(&mut png, image::ImageOutputFormat::Png)
        .unwrap();
    png.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Cents;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_user() -> user::User {
        user::User {
            id: user::Id(Uuid::new_v4()),
            email: user::Email("alice@example.net".to_owned()),
            name: "Alice".to_owned(),
            balance: Cents(0),
            nfc_tag: None,
            created: Utc::now(),
        }
    }

    #[test]
    fn payload_format() {
        let user = test_user();
        assert_eq!(payload(&user), format!("cashless:{}:Alice", user.id.0));
    }

    #[test]
    fn image_is_base64_png() {
        let code = payment_code(&test_user()).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(code.image)
            .unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
