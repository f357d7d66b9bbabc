//! Economy seam
//!
//! The attempt only ever credits the level-pass reward. The wallet itself
//! (persistence, shop purchases) lives outside the core and is handed in by
//! whoever owns the [`crate::GameState`].

use serde::Serialize;

use crate::types::LEVEL_PASS_REWARD;

/// Currency sink/source.
pub trait Economy {
    fn credit(&mut self, amount: u32);
    fn debit(&mut self, amount: u32);
    fn balance(&self) -> u64;
}

impl<E: Economy + ?Sized> Economy for &mut E {
    fn credit(&mut self, amount: u32) {
        (**self).credit(amount)
    }

    fn debit(&mut self, amount: u32) {
        (**self).debit(amount)
    }

    fn balance(&self) -> u64 {
        (**self).balance()
    }
}

/// Fixed reward amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reward {
    LevelPassed,
    DailyLogin,
    Achievement,
}

impl Reward {
    pub fn amount(self) -> u32 {
        match self {
            Reward::LevelPassed => LEVEL_PASS_REWARD,
            Reward::DailyLogin => 40,
            Reward::Achievement => 10,
        }
    }
}

/// In-memory wallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Wallet {
    balance: u64,
    previous: u64,
}

impl Wallet {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            previous: balance,
        }
    }

    /// Balance before the last change.
    pub fn previous(&self) -> u64 {
        self.previous
    }

    pub fn grant(&mut self, reward: Reward) {
        self.credit(reward.amount());
    }
}

impl Economy for Wallet {
    fn credit(&mut self, amount: u32) {
        self.previous = self.balance;
        self.balance = self.balance.saturating_add(amount as u64);
    }

    /// Clamps at zero.
    fn debit(&mut self, amount: u32) {
        self.previous = self.balance;
        self.balance = self.balance.saturating_sub(amount as u64);
    }

    fn balance(&self) -> u64 {
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_amounts() {
        assert_eq!(Reward::LevelPassed.amount(), 100);
        assert_eq!(Reward::DailyLogin.amount(), 40);
        assert_eq!(Reward::Achievement.amount(), 10);
    }

    #[test]
    fn test_wallet_credit_and_debit() {
        let mut w = Wallet::new(50);
        w.grant(Reward::LevelPassed);
        assert_eq!(w.balance(), 150);
        assert_eq!(w.previous(), 50);

        w.debit(30);
        assert_eq!(w.balance(), 120);
        assert_eq!(w.previous(), 150);
    }

    #[test]
    fn test_debit_clamps_at_zero() {
        let mut w = Wallet::new(10);
        w.debit(25);
        assert_eq!(w.balance(), 0);
    }

    #[test]
    fn test_borrowed_economy_forwards() {
        fn pay<E: Economy>(mut economy: E) -> u64 {
            economy.credit(Reward::Achievement.amount());
            economy.balance()
        }

        let mut w = Wallet::default();
        assert_eq!(pay(&mut w), 10);
        assert_eq!(w.balance(), 10);
    }
}
