use std::io;

use encoding_rs::Encoding;
use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{RcDom, SerializableHandle};

/// 序列化文档，`document_encoding` 非空时按该编码输出
pub fn serialize_document(dom: &RcDom, document_encoding: &str) -> io::Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = dom.document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;

    if !document_encoding.is_empty() {
        if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
            let s: &str = &String::from_utf8_lossy(&buf);
            let (data, _, _) = encoding.encode(s);
            buf = data.to_vec();
        }
    }

    Ok(buf)
}
