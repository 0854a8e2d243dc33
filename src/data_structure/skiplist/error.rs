//! 跳表的错误类型，由 error_chain 生成：
//!- @XErr: 错误本体
//!- @XErrKind: 错误种类
//!- @Result: 以 XErr 为错误类型的 Result

use super::Key;

error_chain! {
    types {
        XErr, XErrKind, ResultExt, Result;
    }

    errors {
        InvalidConfig {
            description("Invalid config!")
            display("Invalid config: layer count must be at least 1!")
        }

        InvalidHeight(height: usize, layer_cnt: usize) {
            description("Invalid height!")
            display("Invalid height: {} (layer count {})!", height, layer_cnt)
        }

        InvalidRange(min: Key, max: Key) {
            description("Invalid range!")
            display("Invalid range: [{}, {}]!", min, max)
        }

        AllocationFailure {
            description("Allocation failure!")
            display("Allocation failure!")
        }

        NotFound(key: Key) {
            description("Not exists!")
            display("Not exists: {}!", key)
        }

        Empty {
            description("Not exists!")
            display("Not exists: skip list is empty!")
        }
    }
}

impl XErr {
    ///#### 是否属于"目标不存在"一类的错误
    pub fn is_not_found(&self) -> bool {
        match self.kind() {
            XErrKind::NotFound(_) | XErrKind::Empty => true,
            _ => false,
        }
    }
}
