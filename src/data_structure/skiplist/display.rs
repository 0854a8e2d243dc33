//! 跳表的纵向打印。
//!
//! 每个节点占一行，key 按其参与的层数重复打印，右对齐到最大key的位数；
//! 越过该节点的高层链接以 `|` 标出，相邻节点之间再打印一行 `|` 表示仍然连通的各层：
//!
//!```text
//!  1    1    1
//!  |    |
//!  5    |
//!  |    |
//! 10   10
//!  |
//! 20
//!```

use super::traits::HeightGen;
use super::{Key, SkipList};
use std::fmt;

const SEP: &str = "   ";

//- #: key 的十进制位数
#[inline(always)]
fn digits(key: Key) -> usize {
    key.to_string().len()
}

impl<H: HeightGen> fmt::Display for SkipList<H> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = match self.last_node() {
            Ok(n) => digits(n.key()),
            Err(_) => return Ok(()),
        };

        //仍有链接通向后续节点的最高层
        let mut open = self.layer_cnt() - 1;

        let mut cur = self.zero_node();
        while let Some(node) = cur {
            if node.height() == open {
                while 0 < open && node.forward(open).is_none() {
                    open -= 1;
                }
            }

            let mut cells = vec![];
            (0..=node.height()).for_each(|_| cells.push(format!("{:>w$}", node.key(), w = width)));
            (node.height()..open).for_each(|_| cells.push(format!("{:>w$}", "|", w = width)));
            writeln!(f, "{}", cells.join(SEP))?;

            cur = self.next(node, 0);
            if cur.is_none() {
                break;
            }

            let links = (0..=open)
                .map(|_| format!("{:>w$}", "|", w = width))
                .collect::<Vec<String>>();
            writeln!(f, "{}", links.join(SEP))?;
        }

        Ok(())
    }
}

impl<H: HeightGen> fmt::Debug for SkipList<H> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SkipList")
            .field("layer_cnt", &self.layer_cnt())
            .field("node_cnt_in_layer", &self.node_cnts())
            .field("keys", &self.layer_keys(0))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::super::traits::FixedHeight;
    use super::super::DataRef;
    use super::*;

    #[test]
    fn digit_width() {
        assert_eq!(1, digits(0));
        assert_eq!(1, digits(9));
        assert_eq!(2, digits(10));
        assert_eq!(3, digits(999));
        assert_eq!(10, digits(Key::max_value()));
    }

    #[test]
    fn render_empty() {
        let sl = SkipList::with_height_gen(3, FixedHeight(0)).unwrap();
        assert_eq!("", sl.to_string());
    }

    #[test]
    fn render_single() {
        let mut sl = SkipList::with_height_gen(3, FixedHeight(0)).unwrap();
        sl.insert(7, DataRef::NULL).unwrap();
        assert_eq!("7   7   7\n", sl.to_string());
    }

    #[test]
    fn render_layers() {
        let mut sl = SkipList::with_height_gen(3, FixedHeight(0)).unwrap();
        sl.insert_at_height(1, DataRef::NULL, 0).unwrap();
        sl.insert_at_height(5, DataRef::NULL, 0).unwrap();
        sl.insert_at_height(10, DataRef::NULL, 1).unwrap();
        sl.insert_at_height(20, DataRef::NULL, 0).unwrap();

        let expected = [
            " 1    1    1",
            " |    |",
            " 5    |",
            " |    |",
            "10   10",
            " |",
            "20",
        ]
        .iter()
        .map(|l| format!("{}\n", l))
        .collect::<String>();

        assert_eq!(expected, sl.to_string());
    }
}
