// crates/cs_foundation/src/lib.rs

//! CDO Foundation Layer
//!
//! 基础层，提供整个工作区共享的错误类型和位标志。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `CsError` 与 `ensure!`/`require!` 宏
//! - [`flag`]: 位置/状态/元信息位标志
//!
//! # 示例
//!
//! ```
//! use cs_foundation::{CsError, CsResult, flag::{self, Flag}};
//!
//! fn check_loc(loc: Flag) -> CsResult<()> {
//!     cs_foundation::ensure!(
//!         loc.contains(flag::PRIMAL_CELL),
//!         CsError::invalid_definition("check_loc", "位置必须为主网格单元")
//!     );
//!     Ok(())
//! }
//!
//! assert!(check_loc(flag::PRIMAL_CELL).is_ok());
//! assert!(check_loc(flag::DUAL_CELL).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod flag;

pub use error::{CsError, CsResult};
pub use flag::Flag;
