//! 色板洗牌服务 - 业务能力层
//!
//! 只负责"生成本次测试的色板顺序"，不关心流程

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::{AppResult, ConfigError};
use crate::models::Plate;

/// 一次测试的色板顺序，生成后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    plates: Vec<Plate>,
}

impl Deck {
    pub fn plates(&self) -> &[Plate] {
        &self.plates
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Plate> {
        self.plates.get(index)
    }
}

/// 使用线程本地随机数生成色板顺序
pub fn load_deck(catalog: &[Plate]) -> AppResult<Deck> {
    load_deck_with_rng(catalog, &mut rand::thread_rng())
}

/// 使用指定随机数源生成色板顺序
///
/// 对目录的副本做 Fisher–Yates 洗牌，原目录不会被修改。
pub fn load_deck_with_rng<R: Rng + ?Sized>(catalog: &[Plate], rng: &mut R) -> AppResult<Deck> {
    if catalog.is_empty() {
        return Err(ConfigError::EmptyCatalog.into());
    }

    let mut plates = catalog.to_vec();
    plates.shuffle(rng);

    debug!(
        "色板顺序: {:?}",
        plates.iter().map(|p| p.plate_number).collect::<Vec<_>>()
    );

    Ok(Deck { plates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::ExpectedAnswers;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn plate(plate_number: u32) -> Plate {
        Plate {
            plate_number,
            question: "What number do you see?".to_string(),
            answers: ExpectedAnswers {
                normal: format!("{}", plate_number),
                protanopia: "nothing".to_string(),
                deuteranopia: "nothing".to_string(),
                protanomaly: None,
                deuteranomaly: None,
                total_color_blindness: None,
            },
            image: format!("plates/{}.png", plate_number),
        }
    }

    #[test]
    fn test_empty_catalog() {
        let err = load_deck(&[]).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::EmptyCatalog)));
    }

    #[test]
    fn test_deck_is_permutation() {
        let catalog: Vec<Plate> = (1..=12).map(plate).collect();
        let mut rng = StdRng::seed_from_u64(7);

        let deck = load_deck_with_rng(&catalog, &mut rng).unwrap();
        assert_eq!(deck.len(), catalog.len());

        let mut numbers: Vec<u32> = deck.plates().iter().map(|p| p.plate_number).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());

        // 原目录不变
        assert_eq!(
            catalog.iter().map(|p| p.plate_number).collect::<Vec<_>>(),
            (1..=12).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_single_plate_deck() {
        let deck = load_deck(&[plate(5)]).unwrap();
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.get(0).map(|p| p.plate_number), Some(5));
    }

    #[test]
    fn test_first_position_is_roughly_uniform() {
        let catalog: Vec<Plate> = (1..=4).map(plate).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut first_counts: HashMap<u32, u32> = HashMap::new();

        let rounds = 4000;
        for _ in 0..rounds {
            let deck = load_deck_with_rng(&catalog, &mut rng).unwrap();
            *first_counts.entry(deck.plates()[0].plate_number).or_default() += 1;
        }

        // 期望每个 1000 次，留足余量
        for n in 1..=4 {
            let count = first_counts.get(&n).copied().unwrap_or(0);
            assert!((800..=1200).contains(&count), "plate {} first {} times", n, count);
        }
    }
}
