//! ## 数据结构
//! - skip list(zero node)
pub mod skiplist;
