//! QR code images for the back-cover call to action.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::QrCode;

use crate::error::{BindError, Result};

/// Pixel size of one QR module.
const MODULE_PX: u32 = 10;

/// Encode `payload` as a QR code and return it as PNG bytes.
///
/// The image has no quiet zone; the surrounding frame in the markup
/// provides the margin.
pub fn encode_png(payload: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| BindError::Render(format!("QR encoding failed: {e}")))?;
    let img = code
        .render::<Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(MODULE_PX, MODULE_PX)
        .build();

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| BindError::Render(format!("QR PNG encoding failed: {e}")))?;
    Ok(png)
}
