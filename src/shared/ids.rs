pub const RUN_ID_PREFIX: &str = "wf-";
pub const RUN_ID_RANDOM_BYTES: usize = 6;

/// Returns `wf-` followed by 12 lowercase hex chars drawn from the OS entropy source.
///
/// Collisions are not checked.
pub fn generate_run_id() -> Result<String, getrandom::Error> {
    let mut bytes = [0u8; RUN_ID_RANDOM_BYTES];
    getrandom::getrandom(&mut bytes)?;
    Ok(format!("{RUN_ID_PREFIX}{}", hex_lower(&bytes)))
}

pub fn hex_lower(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(ALPHABET[(byte >> 4) as usize] as char);
        out.push(ALPHABET[(byte & 0x0f) as usize] as char);
    }
    out
}

pub fn is_run_id(value: &str) -> bool {
    value
        .strip_prefix(RUN_ID_PREFIX)
        .map(|rest| {
            rest.len() == RUN_ID_RANDOM_BYTES * 2
                && rest.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        })
        .unwrap_or(false)
}
