//! File fixtures. Only the leading bytes matter for type detection.

use axum_test::multipart::Part;

/// PNG signature plus IHDR chunk header.
pub fn create_minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89,
    ]
}

/// ISO base media header with an mp42 brand, zero padded to `len` bytes.
pub fn create_mp4(len: usize) -> Vec<u8> {
    let mut data = vec![
        0x00, 0x00, 0x00, 0x18, 0x66, 0x74, 0x79, 0x70, 0x6D, 0x70, 0x34, 0x32, 0x00, 0x00, 0x00,
        0x00, 0x6D, 0x70, 0x34, 0x32, 0x69, 0x73, 0x6F, 0x6D,
    ];
    data.resize(len.max(data.len()), 0);
    data
}

pub fn png_part(filename: &str) -> Part {
    Part::bytes(create_minimal_png())
        .file_name(filename.to_string())
        .mime_type("image/png")
}

pub fn mp4_part(filename: &str, len: usize) -> Part {
    Part::bytes(create_mp4(len))
        .file_name(filename.to_string())
        .mime_type("video/mp4")
}
