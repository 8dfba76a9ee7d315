//! Settlement collaborator: moves deposits into and out of the module
//! escrow account and burns auction proceeds.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{Address, Coins};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    #[error("insufficient funds: {address} has {available}, needs {needed}")]
    InsufficientFunds {
        address: Address,
        available: Coins,
        needed: Coins,
    },

    #[error("insufficient escrow: holds {available}, needs {needed}")]
    InsufficientEscrow { available: Coins, needed: Coins },

    #[error("escrow balance overflow")]
    Overflow,
}

/// Multi-denomination settlement service. Empty bundles are no-ops.
pub trait Escrow {
    fn balance(&self, address: &Address) -> Coins;
    fn escrow_balance(&self) -> Coins;

    fn transfer_to_escrow(&mut self, from: &Address, amount: &Coins) -> Result<(), EscrowError>;
    fn transfer_from_escrow(&mut self, to: &Address, amount: &Coins) -> Result<(), EscrowError>;
    fn burn_from_escrow(&mut self, amount: &Coins) -> Result<(), EscrowError>;
}

impl<E: Escrow + ?Sized> Escrow for &mut E {
    fn balance(&self, address: &Address) -> Coins {
        (**self).balance(address)
    }

    fn escrow_balance(&self) -> Coins {
        (**self).escrow_balance()
    }

    fn transfer_to_escrow(&mut self, from: &Address, amount: &Coins) -> Result<(), EscrowError> {
        (**self).transfer_to_escrow(from, amount)
    }

    fn transfer_from_escrow(&mut self, to: &Address, amount: &Coins) -> Result<(), EscrowError> {
        (**self).transfer_from_escrow(to, amount)
    }

    fn burn_from_escrow(&mut self, amount: &Coins) -> Result<(), EscrowError> {
        (**self).burn_from_escrow(amount)
    }
}

fn debit(available: Coins, needed: &Coins, err: impl FnOnce(Coins) -> EscrowError) -> Result<Coins, EscrowError> {
    match available.checked_sub(needed) {
        Some(rest) => Ok(rest),
        None => Err(err(available)),
    }
}

fn credit(balance: &Coins, amount: &Coins) -> Result<Coins, EscrowError> {
    balance.add(amount).map_err(|_| EscrowError::Overflow)
}

/// Account balances, module escrow and a running burned total.
///
/// `total()` is invariant under every escrow operation, which tests use to
/// check that no value is created or lost.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBank {
    balances: BTreeMap<Address, Coins>,
    escrow: Coins,
    burned: Coins,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits new coins to `address`.
    pub fn mint(&mut self, address: &Address, amount: &Coins) -> Result<(), EscrowError> {
        let updated = credit(&self.balance(address), amount)?;
        self.balances.insert(*address, updated);
        Ok(())
    }

    pub fn burned(&self) -> &Coins {
        &self.burned
    }

    /// Sum of all balances, the escrow and everything burned.
    pub fn total(&self) -> Result<Coins, EscrowError> {
        let mut total = credit(&self.escrow, &self.burned)?;
        for balance in self.balances.values() {
            total = credit(&total, balance)?;
        }
        Ok(total)
    }

    fn set_balance(&mut self, address: &Address, balance: Coins) {
        if balance.is_empty() {
            self.balances.remove(address);
        } else {
            self.balances.insert(*address, balance);
        }
    }
}

impl Escrow for InMemoryBank {
    fn balance(&self, address: &Address) -> Coins {
        self.balances.get(address).cloned().unwrap_or_default()
    }

    fn escrow_balance(&self) -> Coins {
        self.escrow.clone()
    }

    fn transfer_to_escrow(&mut self, from: &Address, amount: &Coins) -> Result<(), EscrowError> {
        if amount.is_empty() {
            return Ok(());
        }
        let rest = debit(self.balance(from), amount, |available| EscrowError::InsufficientFunds {
            address: *from,
            available,
            needed: amount.clone(),
        })?;
        self.escrow = credit(&self.escrow, amount)?;
        self.set_balance(from, rest);
        Ok(())
    }

    fn transfer_from_escrow(&mut self, to: &Address, amount: &Coins) -> Result<(), EscrowError> {
        if amount.is_empty() {
            return Ok(());
        }
        let rest = debit(self.escrow.clone(), amount, |available| EscrowError::InsufficientEscrow {
            available,
            needed: amount.clone(),
        })?;
        let updated = credit(&self.balance(to), amount)?;
        self.escrow = rest;
        self.set_balance(to, updated);
        Ok(())
    }

    fn burn_from_escrow(&mut self, amount: &Coins) -> Result<(), EscrowError> {
        if amount.is_empty() {
            return Ok(());
        }
        let rest = debit(self.escrow.clone(), amount, |available| EscrowError::InsufficientEscrow {
            available,
            needed: amount.clone(),
        })?;
        self.burned = credit(&self.burned, amount)?;
        self.escrow = rest;
        Ok(())
    }
}

#[derive(Clone, Debug)]
enum EscrowOp {
    ToEscrow(Address, Coins),
    FromEscrow(Address, Coins),
    Burn(Coins),
}

/// Stages escrow operations over a parent so a failed invocation leaves the
/// parent untouched. Balances seen through the overlay include staged ops.
pub struct PendingEscrow<'a, E: Escrow + ?Sized> {
    parent: &'a mut E,
    balances: BTreeMap<Address, Coins>,
    escrow: Option<Coins>,
    ops: Vec<EscrowOp>,
}

impl<'a, E: Escrow + ?Sized> PendingEscrow<'a, E> {
    pub fn new(parent: &'a mut E) -> Self {
        Self {
            parent,
            balances: BTreeMap::new(),
            escrow: None,
            ops: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Replays the staged operations against the parent in order.
    pub fn commit(self) -> Result<(), EscrowError> {
        for op in self.ops {
            match op {
                EscrowOp::ToEscrow(from, amount) => self.parent.transfer_to_escrow(&from, &amount)?,
                EscrowOp::FromEscrow(to, amount) => self.parent.transfer_from_escrow(&to, &amount)?,
                EscrowOp::Burn(amount) => self.parent.burn_from_escrow(&amount)?,
            }
        }
        Ok(())
    }

    pub fn discard(self) {}
}

impl<E: Escrow + ?Sized> Escrow for PendingEscrow<'_, E> {
    fn balance(&self, address: &Address) -> Coins {
        match self.balances.get(address) {
            Some(balance) => balance.clone(),
            None => self.parent.balance(address),
        }
    }

    fn escrow_balance(&self) -> Coins {
        match &self.escrow {
            Some(escrow) => escrow.clone(),
            None => self.parent.escrow_balance(),
        }
    }

    fn transfer_to_escrow(&mut self, from: &Address, amount: &Coins) -> Result<(), EscrowError> {
        if amount.is_empty() {
            return Ok(());
        }
        let rest = debit(self.balance(from), amount, |available| EscrowError::InsufficientFunds {
            address: *from,
            available,
            needed: amount.clone(),
        })?;
        self.escrow = Some(credit(&self.escrow_balance(), amount)?);
        self.balances.insert(*from, rest);
        self.ops.push(EscrowOp::ToEscrow(*from, amount.clone()));
        Ok(())
    }

    fn transfer_from_escrow(&mut self, to: &Address, amount: &Coins) -> Result<(), EscrowError> {
        if amount.is_empty() {
            return Ok(());
        }
        let rest = debit(self.escrow_balance(), amount, |available| EscrowError::InsufficientEscrow {
            available,
            needed: amount.clone(),
        })?;
        let updated = credit(&self.balance(to), amount)?;
        self.escrow = Some(rest);
        self.balances.insert(*to, updated);
        self.ops.push(EscrowOp::FromEscrow(*to, amount.clone()));
        Ok(())
    }

    fn burn_from_escrow(&mut self, amount: &Coins) -> Result<(), EscrowError> {
        if amount.is_empty() {
            return Ok(());
        }
        let rest = debit(self.escrow_balance(), amount, |available| EscrowError::InsufficientEscrow {
            available,
            needed: amount.clone(),
        })?;
        self.escrow = Some(rest);
        self.ops.push(EscrowOp::Burn(amount.clone()));
        Ok(())
    }
}
