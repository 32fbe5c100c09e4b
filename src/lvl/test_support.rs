//! Byte builders for synthetic level archives, shared by the `lvl` unit tests.

/// One chunk with its header and trailing alignment padding.
pub fn chunk_bytes(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

/// A chunk whose payload is a NUL terminated string.
pub fn string_chunk(tag: &[u8; 4], value: &str) -> Vec<u8> {
    chunk_bytes(tag, format!("{}\0", value).as_bytes())
}

/// An entity class chunk of flavor `tag`; an empty `base` omits BASE.
pub fn class_bytes(tag: &[u8; 4], type_name: &str, base: &str) -> Vec<u8> {
    let mut body = vec![];
    if !base.is_empty() {
        body.extend(string_chunk(b"BASE", base));
    }
    body.extend(string_chunk(b"TYPE", type_name));
    chunk_bytes(tag, &body)
}

/// A `lvl_` sub-level: name hash, body size, then the nested chunks.
pub fn sub_level_bytes(hash: u32, children: &[u8]) -> Vec<u8> {
    let mut payload = hash.to_le_bytes().to_vec();
    payload.extend_from_slice(&(children.len() as u32).to_le_bytes());
    payload.extend_from_slice(children);
    chunk_bytes(b"lvl_", &payload)
}

/// A complete `ucfb` file holding `entc` classes for the (type, base) pairs.
pub fn level_bytes(classes: &[(&str, &str)]) -> Vec<u8> {
    let body: Vec<u8> = classes
        .iter()
        .flat_map(|(type_name, base)| class_bytes(b"entc", type_name, base))
        .collect();
    chunk_bytes(b"ucfb", &body)
}
