//! Listing image rules, generation, and retrieval.
//!
//! Validation only reads the image header to learn the format and
//! dimensions; pixel data is never decoded.

use std::io::Cursor;

use futures::TryStreamExt;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader, Rgb, RgbImage};
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: usize = 2_000_000;
pub const MIN_IMAGE_DIM: u32 = 500;
pub const MAX_IMAGE_DIM: u32 = 2000;
pub const MIN_ASPECT_RATIO: f64 = 0.8;
pub const MAX_ASPECT_RATIO: f64 = 1.2;
pub const MAX_GENERATION_ATTEMPTS: u32 = 10;
pub const JPEG_QUALITY: u8 = 95;
pub const IMAGE_MIME: &str = "image/jpeg";

const IMAGE_NAME_PREFIX: &str = "image";
const IMAGE_FILE_SUFFIX: &str = ".jpeg";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to fetch image: {0}")]
    Fetch(String),

    #[error("image is empty")]
    Empty,

    #[error("image is {0} bytes, the limit is {max}", max = MAX_IMAGE_BYTES)]
    TooLarge(usize),

    #[error("unsupported image format, only JPEG and PNG are accepted")]
    UnsupportedFormat,

    #[error("failed to read image: {0}")]
    Decode(String),

    #[error("image is {0}x{1}, each side must be at least {min} px", min = MIN_IMAGE_DIM)]
    TooSmall(u32, u32),

    #[error("image is {0}x{1}, each side must be at most {max} px", max = MAX_IMAGE_DIM)]
    TooBig(u32, u32),

    #[error("image aspect ratio {0:.2} is outside {min}..={max}", min = MIN_ASPECT_RATIO, max = MAX_ASPECT_RATIO)]
    AspectRatio(f64),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("could not generate an image within {0} attempts")]
    GenerationExhausted(u32),
}

/// Check an image against the listing rules, returning its dimensions.
pub fn validate_image(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge(bytes.len()));
    }

    let format = match image::guess_format(bytes) {
        Ok(f @ (ImageFormat::Jpeg | ImageFormat::Png)) => f,
        _ => return Err(ImageError::UnsupportedFormat),
    };

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    if width < MIN_IMAGE_DIM || height < MIN_IMAGE_DIM {
        return Err(ImageError::TooSmall(width, height));
    }
    if width > MAX_IMAGE_DIM || height > MAX_IMAGE_DIM {
        return Err(ImageError::TooBig(width, height));
    }

    let ratio = f64::from(width) / f64::from(height);
    if !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio) {
        return Err(ImageError::AspectRatio(ratio));
    }

    Ok((width, height))
}

/// Produce a random single-colour JPEG that passes [`validate_image`].
///
/// CPU bound; call from `spawn_blocking`.
pub fn generate_image() -> Result<Vec<u8>, ImageError> {
    let mut rng = rand::thread_rng();

    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let (width, height) = loop {
            let w = rng.gen_range(MIN_IMAGE_DIM..=MAX_IMAGE_DIM);
            let h = rng.gen_range(MIN_IMAGE_DIM..=MAX_IMAGE_DIM);
            let ratio = f64::from(w) / f64::from(h);
            if (MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio) {
                break (w, h);
            }
        };

        let img = RgbImage::from_pixel(width, height, Rgb(rng.gen::<[u8; 3]>()));
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
            .encode_image(&img)
            .map_err(|e| ImageError::Encode(e.to_string()))?;

        if buf.len() <= MAX_IMAGE_BYTES {
            return Ok(buf);
        }
        tracing::warn!(
            "Generated image attempt {} was {} bytes, retrying",
            attempt,
            buf.len()
        );
    }

    Err(ImageError::GenerationExhausted(MAX_GENERATION_ATTEMPTS))
}

/// Download the image behind a listing's `image_url`.
///
/// The body is read in chunks and the download stops as soon as it passes
/// [`MAX_IMAGE_BYTES`], whether or not the server sent a `Content-Length`.
pub async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ImageError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ImageError::Fetch(e.to_string()))?;

    if let Some(len) = response.content_length() {
        if len > MAX_IMAGE_BYTES as u64 {
            return Err(ImageError::TooLarge(usize::try_from(len).unwrap_or(usize::MAX)));
        }
    }

    let mut body = response.bytes_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = body
        .try_next()
        .await
        .map_err(|e| ImageError::Fetch(e.to_string()))?
    {
        if buf.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge(buf.len() + chunk.len()));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

pub fn new_image_name() -> String {
    format!("{}{}", IMAGE_NAME_PREFIX, Uuid::new_v4())
}

/// `image<uuid>.jpeg` -> `image<uuid>`
pub fn parse_image_file_name(file_name: &str) -> Option<&str> {
    let name = file_name.strip_suffix(IMAGE_FILE_SUFFIX)?;
    let id = name.strip_prefix(IMAGE_NAME_PREFIX)?;
    // hyphenated form only
    if id.len() != 36 || Uuid::parse_str(id).is_err() {
        return None;
    }
    Some(name)
}

pub fn image_file_name(name: &str) -> String {
    format!("{}{}", name, IMAGE_FILE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn generated_image_is_valid() {
        let bytes = generate_image().unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        validate_image(&bytes).unwrap();
    }

    #[test]
    fn accepts_square_png() {
        assert_eq!(validate_image(&png(600, 600)).unwrap(), (600, 600));
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(validate_image(&png(400, 400)), Err(ImageError::TooSmall(400, 400))));
        assert!(matches!(validate_image(&png(2100, 2000)), Err(ImageError::TooBig(..))));
        assert!(matches!(validate_image(&png(1000, 600)), Err(ImageError::AspectRatio(_))));
    }

    #[test]
    fn rejects_non_images() {
        assert!(matches!(validate_image(&[]), Err(ImageError::Empty)));
        assert!(matches!(
            validate_image(b"GIF89a not really"),
            Err(ImageError::UnsupportedFormat)
        ));
        assert!(matches!(
            validate_image(&vec![0u8; MAX_IMAGE_BYTES + 1]),
            Err(ImageError::TooLarge(_))
        ));
    }

    /// Serves `total` bytes with chunked transfer encoding and no length
    async fn chunked_server(total: usize) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;

            let head = "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nTransfer-Encoding: chunked\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            let chunk = vec![0xABu8; 64 * 1024];
            let mut sent = 0;
            while sent < total {
                let n = chunk.len().min(total - sent);
                let frame = format!("{:x}\r\n", n);
                if socket.write_all(frame.as_bytes()).await.is_err()
                    || socket.write_all(&chunk[..n]).await.is_err()
                    || socket.write_all(b"\r\n").await.is_err()
                {
                    return;
                }
                sent += n;
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });
        format!("http://{}/big.jpeg", addr)
    }

    #[tokio::test]
    async fn fetch_stops_at_limit_without_content_length() {
        let url = chunked_server(MAX_IMAGE_BYTES * 4).await;
        let err = fetch_image(&reqwest::Client::new(), &url).await.unwrap_err();
        match err {
            ImageError::TooLarge(n) => assert!(n > MAX_IMAGE_BYTES && n < MAX_IMAGE_BYTES * 2),
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_reads_small_chunked_body() {
        let url = chunked_server(100_000).await;
        let bytes = fetch_image(&reqwest::Client::new(), &url).await.unwrap();
        assert_eq!(bytes.len(), 100_000);
    }

    #[test]
    fn image_names() {
        let name = new_image_name();
        let file = image_file_name(&name);
        assert_eq!(parse_image_file_name(&file), Some(name.as_str()));

        assert_eq!(parse_image_file_name("image123.jpeg"), None);
        assert_eq!(parse_image_file_name("picture0e4f0a2c-1d4b-4bb0-9a55-3f1f7f0c2d11.jpeg"), None);
        assert_eq!(parse_image_file_name("image0e4f0a2c-1d4b-4bb0-9a55-3f1f7f0c2d11.png"), None);
        assert_eq!(
            parse_image_file_name("image0e4f0a2c-1d4b-4bb0-9a55-3f1f7f0c2d11.jpeg"),
            Some("image0e4f0a2c-1d4b-4bb0-9a55-3f1f7f0c2d11")
        );
    }
}
