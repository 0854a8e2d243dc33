//! 节点高度的生成策略。

use rand::rngs::SmallRng;
use rand::{FromEntropy, Rng, SeedableRng};

pub trait HeightGen {
    ///- @max[in]: 可取的最大高度(含)，即 layer_cnt - 1
    ///- #: [0, max] 之间的高度
    fn draw(&mut self, max: usize) -> usize;
}

///#### 几何分布 X~G(p=0.5)
///最高一层吸收剩余的全部概率，各层概率之和为1。
//- @rng: 只在创建时播种一次
#[derive(Debug, Clone)]
pub struct GeometricHeight<R: Rng = SmallRng> {
    rng: R,
}

impl GeometricHeight<SmallRng> {
    pub fn from_entropy() -> GeometricHeight<SmallRng> {
        GeometricHeight {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn seed_from_u64(seed: u64) -> GeometricHeight<SmallRng> {
        GeometricHeight {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> GeometricHeight<R> {
    pub fn new(rng: R) -> GeometricHeight<R> {
        GeometricHeight { rng }
    }
}

impl<R: Rng> HeightGen for GeometricHeight<R> {
    fn draw(&mut self, max: usize) -> usize {
        let mut height = 0;
        while height < max && self.rng.gen::<bool>() {
            height += 1;
        }
        height
    }
}

///#### 固定高度，超出上限时取上限
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedHeight(pub usize);

impl HeightGen for FixedHeight {
    #[inline(always)]
    fn draw(&mut self, max: usize) -> usize {
        self.0.min(max)
    }
}
