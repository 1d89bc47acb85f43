//! Low-level wire constants.
//!
//! Frame layout:
//!
//! ```text
//! [0..4]   action code, ASCII (e.g. "CGAM")
//! [4..8]   reserved, zero on output, ignored on input
//! [8..12]  total frame length, u32 BE = 12 + body + 1
//! [12..n]  body: KEY=VALUE tokens separated by single spaces
//! [n]      0x00 terminator
//! ```
//!
//! The actual encode/decode logic lives in `frame_codec`.

/// Size of the fixed frame header.
pub const HEADER_SIZE: usize = 12;

/// Length of the action code at the start of the header.
pub const ACTION_LEN: usize = 4;

/// Offset of the big-endian length field.
pub const LENGTH_OFFSET: usize = 8;

/// Byte closing every frame.
pub const TERMINATOR: u8 = 0x00;

/// Action codes understood by the theater session.
pub mod action {
    pub const CONN: &str = "CONN";
    pub const USER: &str = "USER";
    pub const PROF: &str = "PROF";
    pub const LLST: &str = "LLST";
    pub const LDAT: &str = "LDAT";
    pub const GLST: &str = "GLST";
    pub const GDAT: &str = "GDAT";
    pub const RLST: &str = "RLST";
    pub const RDAT: &str = "RDAT";
    pub const CGAM: &str = "CGAM";
    pub const UGAM: &str = "UGAM";
    pub const RGAM: &str = "RGAM";
    pub const FILE: &str = "FILE";
}
