//! ## Skip List(Zero Node)
//!
//! #### 算法说明
//! - 多层有序单链表，以随机高度实现概率平衡，期望 O(log n) 的查找、插入与删除；
//! - 没有独立的头节点：持有最小key的节点(zero node)即是入口，其高度恒为 layer_cnt - 1，可从任意层到达；
//! - 删除zero node时，其第0层的后继晋升为新的zero node，并接管高于自身原高度的各层指针；
//! - 所有节点存放于arena中，各层的前向指针是arena索引，而非所有权引用；
//! - 逐层节点计数随每次变更同步维护，可据此判断哪些层未被使用。
//!
//! #### 应用场景
//! - memtable、有序缓存、优先级结构等上层存储/索引引擎的构件。
//!
//! #### 实现属性
//! - <font color=Red>×</font> 多线程安全
//! - <font color=Green>√</font> 无 unsafe 代码
//!
//! #### Example
//!```
//!    use zn_skiplist::{DataRef, SkipList};
//!
//!    let mut sl = SkipList::new(4).unwrap();
//!    for key in 0..15 {
//!        sl.insert(key, DataRef::NULL).unwrap();
//!    }
//!    assert_eq!(14, sl.last_node().unwrap().key());
//!
//!    sl.insert(12, DataRef(1989)).unwrap();
//!    assert_eq!(DataRef(1989), sl.lookup(12).unwrap().data());
//!
//!    assert_eq!(10, sl.remove_range(5, 100).unwrap());
//!    assert_eq!(4, sl.last_node().unwrap().key());
//!
//!    sl.destroy();
//!```

pub mod display;
pub mod error;
pub mod traits;


use error::{Result, XErrKind};
use log::{debug, trace};
use rand::rngs::SmallRng;
use std::mem;
use traits::{GeometricHeight, HeightGen};

pub type Key = u32;

///#### 节点在arena中的位置
pub type NodeIdx = usize;

///#### 不透明的数据引用
///跳表只原样存储、返回其值，从不解引用，也不负责其指向对象的生命周期。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataRef(pub usize);

impl DataRef {
    pub const NULL: DataRef = DataRef(0);
}

//- @key: 全表唯一
//- @height: 参与的最高层(含)，0 表示只在底层
//- @data: 原样存储的数据引用
//- @forward: 各层的下一个节点，长度恒为 layer_cnt，高于 height 的层不参与
#[derive(Debug, Clone)]
pub struct Node {
    key: Key,
    height: usize,
    data: DataRef,
    forward: Vec<Option<NodeIdx>>,
}

impl Node {
    //#### 创建节点
    //前向指针数组的内存分配失败时返回 AllocationFailure，此时尚未有任何既有节点指向它
    fn new(key: Key, data: DataRef, height: usize, layer_cnt: usize) -> Result<Node> {
        let mut forward = Vec::new();
        forward
            .try_reserve_exact(layer_cnt)
            .map_err(|_| XErrKind::AllocationFailure)?;
        forward.resize(layer_cnt, None);

        Ok(Node {
            key,
            height,
            data,
            forward,
        })
    }

    #[inline(always)]
    pub fn key(&self) -> Key {
        self.key
    }

    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline(always)]
    pub fn data(&self) -> DataRef {
        self.data
    }

    ///- #: 本节点在 layer 层的下一个节点，超出 height 的层恒为 None
    #[inline(always)]
    pub fn forward(&self, layer: usize) -> Option<NodeIdx> {
        self.forward.get(layer).copied().flatten()
    }
}

//- @arena: 节点存储区，空位为 None
//- @vacant: arena 中可复用的空位
//- @zero: 持有最小key的节点，空表时为 None
//- @layer_cnt: 层数，创建后不可变
//- @node_cnt_in_layer: 各层当前的节点数(含zero node)
//- @height_gen: 随机高度的生成策略
pub struct SkipList<H: HeightGen = GeometricHeight<SmallRng>> {
    arena: Vec<Option<Node>>,
    vacant: Vec<NodeIdx>,
    zero: Option<NodeIdx>,
    layer_cnt: usize,
    node_cnt_in_layer: Vec<usize>,
    height_gen: H,
}

impl SkipList<GeometricHeight<SmallRng>> {
    ///#### 创建跳表，随机数生成器由系统熵播种
    ///- @layer_cnt[in]: 层数，推荐取 log2(预期节点数)
    pub fn new(layer_cnt: usize) -> Result<SkipList<GeometricHeight<SmallRng>>> {
        SkipList::with_height_gen(layer_cnt, GeometricHeight::from_entropy())
    }

    ///#### 创建跳表，随机数生成器以给定种子播种，结构可复现
    pub fn with_seed(layer_cnt: usize, seed: u64) -> Result<SkipList<GeometricHeight<SmallRng>>> {
        SkipList::with_height_gen(layer_cnt, GeometricHeight::seed_from_u64(seed))
    }
}

impl<H: HeightGen> SkipList<H> {
    ///#### 以指定的高度生成策略创建跳表
    ///- @layer_cnt[in]: 为 0 时返回 InvalidConfig
    pub fn with_height_gen(layer_cnt: usize, height_gen: H) -> Result<SkipList<H>> {
        if 0 == layer_cnt {
            bail!(XErrKind::InvalidConfig);
        }

        let mut node_cnt_in_layer = Vec::new();
        node_cnt_in_layer
            .try_reserve_exact(layer_cnt)
            .map_err(|_| XErrKind::AllocationFailure)?;
        node_cnt_in_layer.resize(layer_cnt, 0);

        debug!("skip list created with {} layers", layer_cnt);

        Ok(SkipList {
            arena: vec![],
            vacant: vec![],
            zero: None,
            layer_cnt,
            node_cnt_in_layer,
            height_gen,
        })
    }

    ///#### 销毁跳表，释放全部节点
    ///节点所引用的数据不受影响。
    pub fn destroy(self) {
        debug!(
            "skip list destroyed, {} nodes freed",
            self.node_cnt_in_layer[0]
        );
    }

    ///#### 清空跳表，层数与高度生成策略保持不变
    pub fn clear(&mut self) {
        self.arena.clear();
        self.vacant.clear();
        self.zero = None;
        self.node_cnt_in_layer.iter_mut().for_each(|c| *c = 0);
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.zero.is_none()
    }

    ///- #: 节点总数，即第0层的节点数
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.node_cnt_in_layer[0]
    }

    #[inline(always)]
    pub fn layer_cnt(&self) -> usize {
        self.layer_cnt
    }

    ///- #: layer 层的节点数，layer 越界时为 None
    #[inline(always)]
    pub fn node_cnt_in_layer(&self, layer: usize) -> Option<usize> {
        self.node_cnt_in_layer.get(layer).copied()
    }

    #[inline(always)]
    pub fn node_cnts(&self) -> &[usize] {
        &self.node_cnt_in_layer
    }

    ///#### 自顶层向下，zero node 之后再无节点的层数
    ///空表时所有层都未被使用。
    pub fn unused_layer_cnt(&self) -> usize {
        self.node_cnt_in_layer
            .iter()
            .rev()
            .take_while(|&&c| c <= 1)
            .count()
    }

    ///- #: 持有最小key的节点
    #[inline(always)]
    pub fn zero_node(&self) -> Option<&Node> {
        self.zero.map(|z| self.nd(z))
    }

    #[inline(always)]
    pub fn first_key(&self) -> Option<Key> {
        self.zero_node().map(Node::key)
    }

    ///- #: arena 中 idx 处的节点，空位或越界时为 None
    #[inline(always)]
    pub fn node(&self, idx: NodeIdx) -> Option<&Node> {
        self.arena.get(idx).and_then(Option::as_ref)
    }

    ///- #: node 在 layer 层的下一个节点
    #[inline(always)]
    pub fn next(&self, node: &Node, layer: usize) -> Option<&Node> {
        node.forward(layer).and_then(|idx| self.node(idx))
    }

    ///#### 按key升序遍历第0层
    pub fn iter(&self) -> Iter<'_> {
        self.layer_iter(0)
    }

    ///#### 自 zero node 起遍历 layer 层，layer 越界时为空
    pub fn layer_iter(&self, layer: usize) -> Iter<'_> {
        Iter {
            arena: &self.arena,
            cur: if layer < self.layer_cnt { self.zero } else { None },
            layer,
        }
    }

    ///- #: layer 层中所有节点的key
    pub fn layer_keys(&self, layer: usize) -> Vec<Key> {
        self.layer_iter(layer).map(Node::key).collect()
    }

    ///#### 以随机高度插入节点
    ///key 已存在时替换之，详见 insert_at_height。
    pub fn insert(&mut self, key: Key, data: DataRef) -> Result<()> {
        let height = self.height_gen.draw(self.top());
        self.insert_at_height(key, data, height)
    }

    ///#### 以指定高度插入节点
    ///- @height[in]: 须小于 layer_cnt，否则返回 InvalidHeight
    ///
    ///与 zero node 的key比较：
    ///1. 空表：新节点成为 zero node，高度强制为 layer_cnt - 1；
    ///2. 大于：逐层下降寻找插入位置；若key已存在，先删除旧节点，再以 height 重新插入；
    ///3. 等于：原地覆盖 zero node 的数据引用，结构与计数均不变；
    ///4. 小于：新key/数据接管 zero node，原 zero node 的key/数据以 height 作为普通节点重新插入。
    ///
    ///新节点及其arena空位在改动任何既有指针之前备妥，
    ///故返回 AllocationFailure 时跳表保持原状，替换路径亦不会丢失旧key。
    pub fn insert_at_height(&mut self, key: Key, data: DataRef, height: usize) -> Result<()> {
        if height >= self.layer_cnt {
            bail!(XErrKind::InvalidHeight(height, self.layer_cnt));
        }

        let zero = match self.zero {
            Some(z) => z,
            None => {
                let node = Node::new(key, data, self.top(), self.layer_cnt)?;
                self.reserve_slot()?;
                let idx = self.alloc(node);
                self.zero = Some(idx);
                self.incr_cnts(self.top());
                trace!("key {} inserted as zero node of an empty list", key);
                return Ok(());
            }
        };

        let zero_key = self.nd(zero).key;
        if key == zero_key {
            self.nd_mut(zero).data = data;
            return Ok(());
        }

        let mut node = Node::new(key, data, height, self.layer_cnt)?;
        self.reserve_slot()?;

        let update = if key < zero_key {
            //旧的最小key紧随新的最小key之后，各层的前驱都是 zero node
            vec![zero; self.layer_cnt]
        } else {
            self.predecessors(zero, key)
        };

        if key < zero_key {
            let z = self.nd_mut(zero);
            node.key = mem::replace(&mut z.key, key);
            node.data = mem::replace(&mut z.data, data);
            trace!("key {} took over zero node from key {}", key, node.key);
        }

        self.splice(node, &update);
        Ok(())
    }

    ///#### 查询节点
    ///- #: key 对应的节点；空表、key 小于最小key或不存在时返回 NotFound
    pub fn lookup(&self, key: Key) -> Result<&Node> {
        let mut cur = match self.zero {
            Some(z) if key >= self.nd(z).key => z,
            _ => bail!(XErrKind::NotFound(key)),
        };

        for layer in (0..self.layer_cnt).rev() {
            if key == self.nd(cur).key {
                break;
            }
            while let Some(next) = self.fwd(cur, layer) {
                if self.nd(next).key > key {
                    break;
                }
                cur = next;
            }
        }

        let node = self.nd(cur);
        if key == node.key {
            Ok(node)
        } else {
            bail!(XErrKind::NotFound(key))
        }
    }

    ///#### 查询数据
    pub fn get(&self, key: Key) -> Option<DataRef> {
        self.lookup(key).map(Node::data).ok()
    }

    #[inline(always)]
    pub fn contains(&self, key: Key) -> bool {
        self.lookup(key).is_ok()
    }

    ///#### 查询持有最大key的节点
    ///优先在当前层前进，无法前进时才下降一层。
    pub fn last_node(&self) -> Result<&Node> {
        let mut cur = self.zero.ok_or(XErrKind::Empty)?;
        for layer in (0..self.layer_cnt).rev() {
            while let Some(next) = self.fwd(cur, layer) {
                cur = next;
            }
        }
        Ok(self.nd(cur))
    }

    ///#### 删除节点
    ///- #: 被删节点的数据引用；空表、key 小于最小key或不存在时返回 NotFound
    pub fn remove(&mut self, key: Key) -> Result<DataRef> {
        let zero = match self.zero {
            Some(z) if key >= self.nd(z).key => z,
            _ => bail!(XErrKind::NotFound(key)),
        };

        if key == self.nd(zero).key {
            return Ok(self.remove_zero(zero));
        }

        let update = self.predecessors(zero, key);
        match self.fwd(update[0], 0) {
            Some(victim) if key == self.nd(victim).key => Ok(self.unlink(&update, victim).data),
            _ => bail!(XErrKind::NotFound(key)),
        }
    }

    ///#### 删除 [min, max] 区间内的所有节点
    ///- @min[in]: 若不存在，从其后第一个存在的key开始删除
    ///- @max[in]: 须大于 min，否则返回 InvalidRange
    ///- #: 被删除的节点数量；空表时返回 Empty
    ///
    ///非事务操作：中途失败时，已删除的节点不会恢复。
    pub fn remove_range(&mut self, min: Key, max: Key) -> Result<usize> {
        if min >= max {
            bail!(XErrKind::InvalidRange(min, max));
        }
        let zero = self.zero.ok_or(XErrKind::Empty)?;

        let mut cur = if min <= self.nd(zero).key {
            Some(zero)
        } else {
            self.fwd(self.predecessors(zero, min)[0], 0)
        };

        let mut removed = 0;
        while let Some(idx) = cur {
            let key = self.nd(idx).key;
            if key > max {
                break;
            }
            //zero node 被删除时其后继原地晋升，索引不变
            cur = self.fwd(idx, 0);
            self.remove(key)?;
            removed += 1;
        }

        debug!("{} nodes removed in range [{}, {}]", removed, min, max);
        Ok(removed)
    }

    ///#### 校验跳表的全部不变量
    ///1. 每层自 zero node 起key严格递增；
    ///2. 节点出现在第 L 层当且仅当其 height >= L；
    ///3. 各层计数等于实际遍历所得的节点数；
    ///4. zero node 的高度为 layer_cnt - 1，且 arena 中没有游离节点。
    pub fn check_invariants(&self) -> bool {
        let zero = match self.zero {
            Some(z) => z,
            None => return self.node_cnt_in_layer.iter().all(|&c| 0 == c) && 0 == self.live_cnt(),
        };
        if self.top() != self.nd(zero).height {
            return false;
        }

        let base = self.iter().collect::<Vec<&Node>>();
        if base.len() != self.live_cnt() {
            return false;
        }

        for layer in 0..self.layer_cnt {
            let keys = self.layer_keys(layer);
            if keys.len() != self.node_cnt_in_layer[layer] {
                return false;
            }
            if keys.windows(2).any(|w| w[0] >= w[1]) {
                return false;
            }
            let expected = base
                .iter()
                .filter(|n| n.height >= layer)
                .map(|n| n.key)
                .collect::<Vec<Key>>();
            if keys != expected {
                return false;
            }
        }

        true
    }

    #[inline(always)]
    fn top(&self) -> usize {
        self.layer_cnt - 1
    }

    #[inline(always)]
    fn nd(&self, idx: NodeIdx) -> &Node {
        match &self.arena[idx] {
            Some(n) => n,
            None => unreachable!(),
        }
    }

    #[inline(always)]
    fn nd_mut(&mut self, idx: NodeIdx) -> &mut Node {
        match &mut self.arena[idx] {
            Some(n) => n,
            None => unreachable!(),
        }
    }

    #[inline(always)]
    fn fwd(&self, idx: NodeIdx, layer: usize) -> Option<NodeIdx> {
        self.nd(idx).forward[layer]
    }

    fn live_cnt(&self) -> usize {
        self.arena.len() - self.vacant.len()
    }

    fn incr_cnts(&mut self, highest_layer: usize) {
        self.node_cnt_in_layer[..=highest_layer]
            .iter_mut()
            .for_each(|c| *c += 1);
    }

    fn decr_cnts(&mut self, highest_layer: usize) {
        self.node_cnt_in_layer[..=highest_layer]
            .iter_mut()
            .for_each(|c| *c -= 1);
    }

    //#### 确保 alloc 必然成功
    //vacant 的容量始终不小于 arena 的长度，故 free 时亦无需再分配
    fn reserve_slot(&mut self) -> Result<()> {
        if self.vacant.is_empty() {
            self.arena
                .try_reserve(1)
                .map_err(|_| XErrKind::AllocationFailure)?;
            let need = self.arena.len() + 1 - self.vacant.len();
            self.vacant
                .try_reserve(need)
                .map_err(|_| XErrKind::AllocationFailure)?;
        }
        Ok(())
    }

    fn alloc(&mut self, node: Node) -> NodeIdx {
        match self.vacant.pop() {
            Some(idx) => {
                self.arena[idx] = Some(node);
                idx
            }
            None => {
                self.arena.push(Some(node));
                self.arena.len() - 1
            }
        }
    }

    fn free(&mut self, idx: NodeIdx) -> Node {
        match self.arena[idx].take() {
            Some(n) => {
                self.vacant.push(idx);
                n
            }
            None => unreachable!(),
        }
    }

    //#### 自 zero node 逐层下降
    //- @key[in]: 须大于 zero node 的key
    //- #: 各层中最后一个key小于 key 的节点，下标即层号
    fn predecessors(&self, zero: NodeIdx, key: Key) -> Vec<NodeIdx> {
        let mut update = vec![zero; self.layer_cnt];
        let mut cur = zero;
        for layer in (0..self.layer_cnt).rev() {
            while let Some(next) = self.fwd(cur, layer) {
                if self.nd(next).key >= key {
                    break;
                }
                cur = next;
            }
            update[layer] = cur;
        }
        update
    }

    //#### 将 node 接入其高度以下的各层
    //- @update[in]: node.key 在各层的前驱
    //同key的旧节点先被摘除释放，不会复用其指针
    fn splice(&mut self, node: Node, update: &[NodeIdx]) {
        if let Some(old) = self.fwd(update[0], 0) {
            if node.key == self.nd(old).key {
                trace!("key {} exists, replacing", node.key);
                self.unlink(update, old);
            }
        }

        let key = node.key;
        let height = node.height;
        let idx = self.alloc(node);
        for layer in 0..=height {
            let prev = update[layer];
            let next = self.fwd(prev, layer);
            self.nd_mut(idx).forward[layer] = next;
            self.nd_mut(prev).forward[layer] = Some(idx);
        }
        self.incr_cnts(height);

        trace!("key {} spliced at height {}", key, height);
    }

    //#### 将非 zero node 的 victim 从其参与的各层摘除并释放
    //- @update[in]: victim.key 在各层的前驱，height 以下各层必然指向 victim
    fn unlink(&mut self, update: &[NodeIdx], victim: NodeIdx) -> Node {
        let height = self.nd(victim).height;
        for layer in (0..=height).rev() {
            let prev = update[layer];
            debug_assert_eq!(Some(victim), self.fwd(prev, layer));
            let next = self.fwd(victim, layer);
            self.nd_mut(prev).forward[layer] = next;
        }
        self.decr_cnts(height);

        let node = self.free(victim);
        trace!("key {} unlinked from layers [0, {}]", node.key, height);
        node
    }

    //#### 删除 zero node
    //第0层的后继晋升为新的 zero node：
    //高于后继原高度的各层指针由旧 zero node 移交，后继原高度以下的各层本就已正确相连；
    //这些高层中旧 zero node 被后继顶替，计数不变，只需递减后继原高度以下各层的计数
    fn remove_zero(&mut self, zero: NodeIdx) -> DataRef {
        let succ = match self.fwd(zero, 0) {
            Some(s) => s,
            None => {
                self.zero = None;
                let old = self.free(zero);
                self.decr_cnts(old.height);
                trace!("key {} removed, list is empty", old.key);
                return old.data;
            }
        };

        let succ_height = self.nd(succ).height;
        for layer in succ_height + 1..self.layer_cnt {
            let next = self.fwd(zero, layer);
            self.nd_mut(succ).forward[layer] = next;
        }
        let top = self.top();
        self.nd_mut(succ).height = top;
        self.decr_cnts(succ_height);
        self.zero = Some(succ);

        let old = self.free(zero);
        trace!(
            "key {} removed, key {} promoted to zero node",
            old.key,
            self.nd(succ).key
        );
        old.data
    }
}

///#### 沿单层升序遍历节点
pub struct Iter<'a> {
    arena: &'a [Option<Node>],
    cur: Option<NodeIdx>,
    layer: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.arena.get(self.cur?).and_then(Option::as_ref)?;
        self.cur = node.forward(self.layer);
        Some(node)
    }
}

impl<'a, H: HeightGen> IntoIterator for &'a SkipList<H> {
    type Item = &'a Node;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
