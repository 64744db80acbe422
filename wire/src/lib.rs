//! Runtime support for code generated by the netmsg schema compiler.
//!
//! Generated message types implement [`NetMessage`], generated enums
//! implement [`WireEnum`] and are carried in fields as [`EnumValue`], and the
//! generated dispatch table is a [`Registry`]. All of them read and write
//! through [`ReadBuffer`] / [`WriteBuffer`].
//!
//! ```
//! use netmsg_wire::*;
//!
//! let mut bb = WriteBuffer::new();
//! bb.write_u64(42);
//! bb.write_string("").unwrap();
//! let bytes = bb.data();
//! assert_eq!(bytes, [42, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
//!
//! let mut rb = ReadBuffer::new(&bytes);
//! assert_eq!(rb.read_u64(), Ok(42));
//! assert_eq!(rb.read_string(), Ok(String::new()));
//! ```

pub mod bb;
pub mod error;
pub mod message;
pub mod registry;
pub mod width;

pub use bb::*;
pub use error::*;
pub use message::*;
pub use registry::*;
pub use width::*;
