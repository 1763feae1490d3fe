//! `SdsString` — a binary-safe, amortized-growth dynamic byte buffer.
//!
//! Modeled after redis's `sds.h` (see `examples/original_source`), with the
//! `(len, free)` header held as proper Rust fields instead of the source's
//! pointer-with-negative-offset trick. The trailing
//! sentinel NUL byte is kept for interop with C-string-expecting FFI, via
//! [`SdsString::as_bytes_with_nul`]; Rust code should just use
//! [`SdsString::as_bytes`].

use std::cmp::Ordering;
use std::fmt;

/// Preallocation doubles below this size, and grows by a fixed slab above
/// it — matches `SDS_MAX_PREALLOC` in the original.
const MAX_PREALLOC: usize = 1024 * 1024;

/// A binary-safe, amortized-growth byte buffer.
///
/// Internally `buf` always holds `len() + 1` bytes, the last of which is the
/// sentinel `0`; `buf.capacity() - buf.len()` is the free/slack region ahead
/// of the sentinel that future appends can use without reallocating.
#[derive(Clone)]
pub struct SdsString {
    buf: Vec<u8>,
}

impl SdsString {
    /// Creates a new string with exactly the given contents.
    pub fn new(bytes: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(bytes.len() + 1);
        buf.extend_from_slice(bytes);
        buf.push(0);
        Self { buf }
    }

    /// Creates an empty string.
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Deep-copies `self`. The clone's free capacity is unspecified (it is
    /// allocated with zero slack, matching the original `sdsdup`).
    pub fn dup(&self) -> Self {
        Self::new(self.as_bytes())
    }

    /// Number of user bytes currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unused capacity following the user bytes.
    #[inline]
    pub fn avail(&self) -> usize {
        self.buf.capacity() - self.buf.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.buf.len() - 1]
    }

    /// Returns the buffer including its trailing sentinel NUL, for callers
    /// that need a C-string-compatible view. Only meaningful when the
    /// contents have no embedded NUL.
    #[inline]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf
    }

    /// Ensures at least `add` additional writable bytes are available
    /// without reallocating again. If the current free capacity already
    /// covers `add`, this is a no-op. Otherwise the buffer is reallocated
    /// to `len + add`, doubled if that total is below 1 MiB, or else grown
    /// by a flat 1 MiB slab — giving amortized O(1) append.
    pub fn grow_room(&mut self, add: usize) {
        if self.avail() >= add {
            return;
        }
        let len = self.len();
        let mut new_len = len + add;
        if new_len < MAX_PREALLOC {
            new_len *= 2;
        } else {
            new_len += MAX_PREALLOC;
        }
        let mut new_buf = Vec::with_capacity(new_len + 1);
        new_buf.extend_from_slice(self.as_bytes());
        new_buf.push(0);
        self.buf = new_buf;
    }

    /// Exposes the buffer's unused tail for the caller to write into
    /// directly. The caller must commit however many bytes it wrote via
    /// [`SdsString::incr_len`] before doing anything else with `self`.
    pub fn spare_capacity_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        let cap = self.buf.capacity();
        // Safety: bytes in [len, cap) are allocated but logically unused —
        // handing them out as a plain `&mut [u8]` is sound because the
        // caller may only read back what it itself wrote, and `incr_len`
        // is the only way to extend the logically-initialized prefix.
        unsafe { std::slice::from_raw_parts_mut(self.buf.as_mut_ptr().add(len), cap - len) }
    }

    /// Moves the used/free boundary by `delta` (which may be negative)
    /// without reallocating. `delta` bytes at the old length must already
    /// have been written through [`SdsString::spare_capacity_mut`] if
    /// `delta > 0`. Panics if the result would be negative or would exceed
    /// the currently allocated capacity.
    pub fn incr_len(&mut self, delta: isize) {
        let len = self.len() as isize;
        let new_len = len + delta;
        assert!(new_len >= 0, "sds: incr_len would underflow length");
        let new_len = new_len as usize;
        assert!(
            new_len + 1 <= self.buf.capacity(),
            "sds: incr_len exceeds reserved capacity"
        );
        // Safety: bytes [0, new_len) are initialized — either previously
        // committed, or just written via `spare_capacity_mut` per this
        // method's contract. We then immediately (re)write the sentinel.
        unsafe {
            self.buf.set_len(new_len + 1);
        }
        self.buf[new_len] = 0;
    }

    /// Appends `data`, growing the buffer first if needed.
    pub fn cat(&mut self, data: &[u8]) -> &mut Self {
        self.grow_room(data.len());
        let dst = self.spare_capacity_mut();
        dst[..data.len()].copy_from_slice(data);
        self.incr_len(data.len() as isize);
        self
    }

    /// Appends the contents of another `SdsString`.
    pub fn cat_sds(&mut self, other: &SdsString) -> &mut Self {
        self.cat(other.as_bytes())
    }

    /// Appends a formatted value. Rust's `String`/`Vec` already grow
    /// amortized-doubling on their own, so there's no need to hand-roll the
    /// "retry with a doubled scratch buffer until it fits" loop the C
    /// `vsnprintf`-based `sdscatvprintf` uses.
    pub fn cat_printf(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        use std::fmt::Write;
        let mut scratch = String::new();
        scratch
            .write_fmt(args)
            .expect("formatting into a String cannot fail");
        self.cat(scratch.as_bytes())
    }

    /// Overwrites the contents from position 0 with `data`, growing if
    /// necessary.
    pub fn cpy(&mut self, data: &[u8]) {
        let needed = data.len().saturating_sub(self.len());
        if needed > 0 {
            self.grow_room(needed);
        }
        let mut new_buf = Vec::with_capacity(self.buf.capacity());
        new_buf.extend_from_slice(data);
        new_buf.push(0);
        self.buf = new_buf;
    }

    /// Removes from both ends any byte whose value appears in `cset`.
    pub fn trim(&mut self, cset: &[u8]) {
        let bytes = self.as_bytes();
        let start = bytes
            .iter()
            .position(|b| !cset.contains(b))
            .unwrap_or(bytes.len());
        let end = bytes
            .iter()
            .rposition(|b| !cset.contains(b))
            .map(|i| i + 1)
            .unwrap_or(start);
        let trimmed = bytes[start..end.max(start)].to_vec();
        self.cpy(&trimmed);
    }

    /// Retains the inclusive sub-range `[start, end]`, with Redis/Python
    /// slice semantics: negative indices count from the end, out-of-range
    /// indices clamp, and `start > end` yields an empty string.
    pub fn range(&mut self, start: isize, end: isize) {
        let len = self.len() as isize;
        if len == 0 {
            return;
        }
        let norm = |i: isize| -> isize {
            if i < 0 {
                (len + i).max(0)
            } else {
                i
            }
        };
        let mut start = norm(start);
        let mut end = norm(end);
        if start > end || start >= len {
            start = 0;
            end = -1;
        }
        if end >= len {
            end = len - 1;
        }
        let (start, end) = (start as usize, end);
        let new_bytes = if end < start as isize {
            Vec::new()
        } else {
            self.as_bytes()[start..=end as usize].to_vec()
        };
        self.cpy(&new_bytes);
    }

    /// Sets `len = 0` and keeps the allocation (lazy free) — no
    /// reallocation happens here.
    pub fn clear(&mut self) {
        // Safety: index 0 is always initialized (the sentinel itself, at
        // minimum); shrinking the logical length never exposes
        // uninitialized memory.
        unsafe {
            self.buf.set_len(1);
        }
        self.buf[0] = 0;
    }

    /// Shrinks the backing allocation to fit the current contents exactly.
    pub fn remove_free_space(&mut self) {
        self.buf.shrink_to_fit();
    }

    /// Lexicographic byte-wise comparison, length as the tiebreaker —
    /// exactly what slice `Ord` already gives us.
    pub fn cmp(&self, other: &SdsString) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }

    /// Builds a byte-translation table mapping each byte in `from` to the
    /// byte at the same position in `to`, then applies it in place.
    pub fn map_chars(&mut self, from: &[u8], to: &[u8]) {
        assert_eq!(from.len(), to.len());
        let mut table: [u8; 256] = [0; 256];
        for i in 0..256 {
            table[i] = i as u8;
        }
        for (f, t) in from.iter().zip(to.iter()) {
            table[*f as usize] = *t;
        }
        let len = self.len();
        let bytes = &mut self.buf[..len];
        for b in bytes.iter_mut() {
            *b = table[*b as usize];
        }
    }
}

impl PartialEq for SdsString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}
impl Eq for SdsString {}

impl fmt::Debug for SdsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SdsString({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Splits `s` on the byte sequence `sep`. An empty `sep` yields a single
/// token equal to the whole input (mirrors `sdssplitlen`'s handling of a
/// zero-length separator).
pub fn split_len(s: &[u8], sep: &[u8]) -> Vec<SdsString> {
    if sep.is_empty() {
        return vec![SdsString::new(s)];
    }
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + sep.len() <= s.len() {
        if &s[i..i + sep.len()] == sep {
            out.push(SdsString::new(&s[start..i]));
            i += sep.len();
            start = i;
        } else {
            i += 1;
        }
    }
    out.push(SdsString::new(&s[start..]));
    out
}

/// Joins `parts` with `sep` between each element.
pub fn join(parts: &[SdsString], sep: &[u8]) -> SdsString {
    let mut out = SdsString::empty();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.cat(sep);
        }
        out.cat(part.as_bytes());
    }
    out
}

/// Error returned by [`split_args`] when the input is malformed (an
/// unterminated quote).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unterminated quote in split_args input")]
pub struct SplitArgsError;

/// Decodes a single `\xHH`/`\n`/`\r`/`\t`/`\b`/`\a`/`\\`/`\"` escape starting
/// at the backslash `line[i]`, appending the decoded byte(s) to `token` and
/// returning the index just past the escape. Used both inside `"..."` tokens
/// and in bare unquoted segments, which recognize the same escapes.
fn decode_escape(line: &[u8], i: usize, token: &mut Vec<u8>) -> usize {
    let n = line.len();
    if i + 1 >= n {
        token.push(line[i]);
        return i + 1;
    }
    match line[i + 1] {
        b'x' if i + 3 < n && line[i + 2].is_ascii_hexdigit() && line[i + 3].is_ascii_hexdigit() => {
            let hi = (line[i + 2] as char).to_digit(16).unwrap();
            let lo = (line[i + 3] as char).to_digit(16).unwrap();
            token.push(((hi << 4) | lo) as u8);
            i + 4
        }
        b'n' => {
            token.push(b'\n');
            i + 2
        }
        b'r' => {
            token.push(b'\r');
            i + 2
        }
        b't' => {
            token.push(b'\t');
            i + 2
        }
        b'b' => {
            token.push(0x08);
            i + 2
        }
        b'a' => {
            token.push(0x07);
            i + 2
        }
        b'\\' => {
            token.push(b'\\');
            i + 2
        }
        b'"' => {
            token.push(b'"');
            i + 2
        }
        other => {
            token.push(other);
            i + 2
        }
    }
}

/// Parses a shell-like quoted command line into tokens.
///
/// Supports `"..."` double-quoted tokens with `\xHH`, `\n`, `\r`, `\t`,
/// `\b`, `\a`, `\\`, `\"` escapes, and `'...'` single-quoted tokens where
/// only `\\` and `\'` are recognized as escapes. The same `\xHH`/`\n`/...
/// escapes are also recognized in bare unquoted segments (e.g. a stray
/// `\x41` outside any quotes decodes to `A`), matching the quoted set.
/// Unquoted whitespace separates tokens. An unterminated quote is an error.
pub fn split_args(line: &[u8]) -> Result<Vec<SdsString>, SplitArgsError> {
    let mut out = Vec::new();
    let mut i = 0;
    let n = line.len();

    while i < n {
        while i < n && (line[i] as char).is_whitespace() {
            i += 1;
        }
        if i >= n {
            break;
        }

        let mut token = Vec::new();
        let mut in_token = true;
        while in_token {
            if i < n && line[i] == b'"' {
                i += 1;
                loop {
                    if i >= n {
                        return Err(SplitArgsError);
                    }
                    if line[i] == b'\\' && i + 1 < n {
                        i = decode_escape(line, i, &mut token);
                    } else if line[i] == b'"' {
                        i += 1;
                        break;
                    } else {
                        token.push(line[i]);
                        i += 1;
                    }
                }
            } else if i < n && line[i] == b'\'' {
                i += 1;
                loop {
                    if i >= n {
                        return Err(SplitArgsError);
                    }
                    if line[i] == b'\\' && i + 1 < n && (line[i + 1] == b'\\' || line[i + 1] == b'\'')
                    {
                        token.push(line[i + 1]);
                        i += 2;
                    } else if line[i] == b'\'' {
                        i += 1;
                        break;
                    } else {
                        token.push(line[i]);
                        i += 1;
                    }
                }
            } else {
                while i < n && !(line[i] as char).is_whitespace() {
                    if line[i] == b'\\' && i + 1 < n {
                        i = decode_escape(line, i, &mut token);
                    } else {
                        token.push(line[i]);
                        i += 1;
                    }
                }
            }

            // Keep consuming if the next byte is immediately another quoted
            // or bare segment glued onto this token (e.g. "foo"bar).
            in_token = i < n && !(line[i] as char).is_whitespace();
        }

        out.push(SdsString::new(&token));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_safety() {
        let s = SdsString::new(b"a\0b");
        assert_eq!(s.len(), 3);
        let t = SdsString::new(b"a\0c");
        assert!(s.cmp(&t) == Ordering::Less);
        assert_eq!(s.as_bytes_with_nul()[3], 0);
    }

    #[test]
    fn cat_grows_and_preserves_prefix() {
        let mut s = SdsString::new(b"hello");
        s.cat(b" world");
        assert_eq!(s.as_bytes(), b"hello world");
        assert_eq!(s.len(), 11);
    }

    #[test]
    fn dup_roundtrips() {
        let s = SdsString::new(b"a\0b");
        let d = s.dup();
        assert_eq!(s.cmp(&d), Ordering::Equal);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut s = SdsString::new(b"hello world, this is a longer string");
        s.grow_room(100);
        let cap_before = s.avail() + s.len();
        s.clear();
        assert_eq!(s.len(), 0);
        assert!(s.avail() >= cap_before);
    }

    #[test]
    fn range_negative_indices() {
        let mut s = SdsString::new(b"Hello World");
        s.range(-5, -1);
        assert_eq!(s.as_bytes(), b"World");
    }

    #[test]
    fn range_start_after_end_is_empty() {
        let mut s = SdsString::new(b"Hello World");
        s.range(5, 2);
        assert_eq!(s.as_bytes(), b"");
    }

    #[test]
    fn trim_strips_configured_chars() {
        let mut s = SdsString::new(b"  trim me  ");
        s.trim(b" ");
        assert_eq!(s.as_bytes(), b"trim me");
    }

    #[test]
    fn split_len_basic() {
        let parts = split_len(b"a,b,,c", b",");
        let joined: Vec<&[u8]> = parts.iter().map(|p| p.as_bytes()).collect();
        assert_eq!(joined, vec![b"a".as_ref(), b"b".as_ref(), b"".as_ref(), b"c".as_ref()]);
    }

    #[test]
    fn split_args_quoting() {
        let tokens = split_args(br#"  foo "bar baz" 'qux\'\\' \x41  "#).unwrap();
        let strs: Vec<&[u8]> = tokens.iter().map(|t| t.as_bytes()).collect();
        assert_eq!(
            strs,
            vec![
                b"foo".as_ref(),
                b"bar baz".as_ref(),
                b"qux'\\".as_ref(),
                b"A".as_ref(),
            ]
        );
    }

    #[test]
    fn split_args_unterminated_quote_fails() {
        assert!(split_args(br#"foo "bar"#).is_err());
    }

    #[test]
    fn map_chars_translates_bytes() {
        let mut s = SdsString::new(b"hello");
        s.map_chars(b"el", b"ip");
        assert_eq!(s.as_bytes(), b"hippo");
    }

    #[test]
    fn join_roundtrip() {
        let parts = vec![SdsString::new(b"a"), SdsString::new(b"b"), SdsString::new(b"c")];
        let joined = join(&parts, b"-");
        assert_eq!(joined.as_bytes(), b"a-b-c");
    }
}
