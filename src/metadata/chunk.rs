//! PNG chunk plumbing: header-only text chunk decoding (via `png`), pixel
//! encoding (via `image`), and metadata chunk splicing (via `img-parts`).

use image::{DynamicImage, ImageFormat};
use img_parts::Bytes;
use img_parts::png::{Png, PngChunk};
use std::io::Cursor;

const CHUNK_IHDR: [u8; 4] = *b"IHDR";
const CHUNK_ITXT: [u8; 4] = *b"iTXt";
const CHUNK_TEXT: [u8; 4] = *b"tEXt";
const CHUNK_ZTXT: [u8; 4] = *b"zTXt";

/// A decoded text chunk found in the PNG header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextChunk {
    pub keyword: String,
    pub text: String,
}

/// Longest keyword a PNG text chunk may carry.
const MAX_KEYWORD_LEN: usize = 79;

/// Whether `keyword` can name a PNG text chunk: 1 to 79 printable Latin-1
/// characters (so no NUL).
pub(crate) fn is_valid_keyword(keyword: &str) -> bool {
    let len = keyword.chars().count();
    (1..=MAX_KEYWORD_LEN).contains(&len)
        && keyword
            .chars()
            .all(|c| matches!(c, ' '..='~' | '\u{A1}'..='\u{FF}'))
}

/// Latin-1 bytes of a keyword accepted by [`is_valid_keyword`].
fn latin1(keyword: &str) -> Vec<u8> {
    keyword.chars().map(|c| c as u8).collect()
}

/// Decode every text chunk that precedes the first `IDAT` in `header`.
///
/// `header` may be a prefix of the file. Any error here is structural
/// (truncated or invalid data); the buffer is in memory so there is no real I/O.
pub(crate) fn read_text_chunks(header: &[u8]) -> Result<Vec<TextChunk>, png::DecodingError> {
    let decoder = png::Decoder::new(Cursor::new(header));
    let reader = decoder.read_info()?;
    let info = reader.info();

    let mut chunks = Vec::with_capacity(
        info.utf8_text.len() + info.uncompressed_latin1_text.len() + info.compressed_latin1_text.len(),
    );
    for chunk in &info.utf8_text {
        chunks.push(TextChunk {
            keyword: chunk.keyword.clone(),
            text: chunk.get_text()?,
        });
    }
    for chunk in &info.uncompressed_latin1_text {
        chunks.push(TextChunk {
            keyword: chunk.keyword.clone(),
            text: chunk.text.clone(),
        });
    }
    for chunk in &info.compressed_latin1_text {
        chunks.push(TextChunk {
            keyword: chunk.keyword.clone(),
            text: chunk.get_text()?,
        });
    }
    Ok(chunks)
}

/// Encode `image` as a plain PNG with no ancillary text.
pub(crate) fn encode_image(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut encoded = Vec::new();
    image.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;
    Ok(encoded)
}

/// Replace the metadata chunk of an encoded PNG.
///
/// `keyword` must pass [`is_valid_keyword`]. Every text chunk carrying it is
/// removed. When `text` is given, a fresh uncompressed `iTXt` chunk is
/// inserted right after `IHDR` so a short header scan finds it. All other
/// chunks are kept byte-for-byte.
pub(crate) fn embed(
    encoded: Bytes,
    keyword: &str,
    text: Option<&str>,
) -> Result<Bytes, img_parts::Error> {
    let mut png = Png::from_bytes(encoded)?;
    let keyword = latin1(keyword);

    let chunks = png.chunks_mut();
    chunks.retain(|chunk| chunk_keyword(chunk) != Some(keyword.as_slice()));

    if let Some(text) = text {
        let at = chunks
            .iter()
            .position(|chunk| chunk.kind() == CHUNK_IHDR)
            .map_or(0, |ihdr| ihdr + 1);
        chunks.insert(
            at,
            PngChunk::new(CHUNK_ITXT, Bytes::from(itxt_payload(&keyword, text))),
        );
    }

    Ok(png.encoder().bytes())
}

/// Keyword of a text chunk (`tEXt`, `zTXt`, `iTXt`): the bytes before the first NUL.
fn chunk_keyword(chunk: &PngChunk) -> Option<&[u8]> {
    let kind = chunk.kind();
    if kind != CHUNK_ITXT && kind != CHUNK_TEXT && kind != CHUNK_ZTXT {
        return None;
    }
    let contents = chunk.contents();
    let end = contents.iter().position(|&b| b == 0)?;
    Some(&contents[..end])
}

/// `keyword NUL compression-flag compression-method language NUL translated-keyword NUL text`
fn itxt_payload(keyword: &[u8], text: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(keyword.len() + text.len() + 5);
    payload.extend_from_slice(keyword);
    payload.push(0);
    // uncompressed, method 0
    payload.push(0);
    payload.push(0);
    // empty language tag and translated keyword
    payload.push(0);
    payload.push(0);
    payload.extend_from_slice(text.as_bytes());
    payload
}
