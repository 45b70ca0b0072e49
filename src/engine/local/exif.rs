use crate::core::ExifInfo;
use exif::{In, Reader, Tag, Value};
use std::io::Cursor;

/// Read the EXIF subset reported for an image. Files without EXIF, or with
/// a container the reader does not understand, yield `None`.
pub fn read_exif(bytes: &[u8]) -> Option<ExifInfo> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let text = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|field| field_to_string(&field.value))
            .filter(|s| !s.is_empty())
    };

    let info = ExifInfo {
        image_description: text(Tag::ImageDescription),
        equip_make: text(Tag::Make),
        equip_model: text(Tag::Model),
        software_used: text(Tag::Software),
        date_time: text(Tag::DateTime),
        artist: text(Tag::Artist),
        user_comment: text(Tag::UserComment),
    };

    (!info.is_empty()).then_some(info)
}

fn field_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(vec) => vec.first().map(|ascii| {
            String::from_utf8_lossy(ascii)
                .trim_end_matches('\0')
                .trim()
                .to_string()
        }),
        // UserComment carries an 8 byte character code prefix
        Value::Undefined(data, _) if data.len() > 8 => Some(
            String::from_utf8_lossy(&data[8..])
                .trim_end_matches('\0')
                .trim()
                .to_string(),
        ),
        Value::Undefined(_, _) => None,
        other => Some(format!("{}", other.display_as(Tag::DateTime))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_exif_in_plain_bytes() {
        assert!(read_exif(b"not an image").is_none());
    }

    #[test]
    fn test_ascii_field() {
        let value = Value::Ascii(vec![b"Canon\0".to_vec()]);
        assert_eq!(field_to_string(&value).as_deref(), Some("Canon"));
    }

    #[test]
    fn test_user_comment_prefix_is_skipped() {
        let mut data = b"ASCII\0\0\0".to_vec();
        data.extend_from_slice(b"holiday");
        let value = Value::Undefined(data, 0);
        assert_eq!(field_to_string(&value).as_deref(), Some("holiday"));
    }
}
