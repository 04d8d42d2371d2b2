/// Leading bytes of every gzip member (RFC 1952, ID1 ID2).
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

#[inline]
pub fn has_gzip_magic(head: &[u8]) -> bool {
    head.len() >= GZIP_MAGIC.len() && head[..GZIP_MAGIC.len()] == GZIP_MAGIC
}
