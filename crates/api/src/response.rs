use serde::Serialize;

/// Standardized success envelope: `{"success": true, "data": ...}`.
///
/// Mirrors the error body shape produced by `AppError`, which carries
/// `"success": false` instead, so clients can branch on a single field.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
