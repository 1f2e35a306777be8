use super::{ContractArg, ContractError, ContractTemplate, Result};
use crate::{caches::Cache, EngineFlags, SigCacheKey, TxScriptEngine};
use log::debug;
use puzzle_consensus_core::{
    config::params::Params,
    hashing::{sighash::SigHashReusedValuesUnsync, sighash_type::SIG_HASH_ALL_FORK_ID},
    sign::sign_input,
    tx::{PopulatedTransaction, ScriptPublicKey, Transaction, UtxoEntry},
};
use puzzle_wallet_keys::privatekey::PrivateKey;
use std::{path::Path, sync::Arc};

/// The transaction input a contract is spent by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxContext {
    tx: Transaction,
    input_index: usize,
    input_amount: u64,
}

impl TxContext {
    pub fn new(tx: Transaction, input_index: usize, input_amount: u64) -> Result<Self> {
        if input_index >= tx.inputs.len() {
            return Err(ContractError::InvalidInputIndex(input_index, tx.inputs.len()));
        }
        Ok(Self { tx, input_index, input_amount })
    }

    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    pub fn input_index(&self) -> usize {
        self.input_index
    }

    pub fn input_amount(&self) -> u64 {
        self.input_amount
    }

    /// Entries for every input of the transaction. Only the entry of the bound input takes part
    /// in its signature digest, the others are empty.
    fn entries(&self, locking_script: &ScriptPublicKey) -> Vec<UtxoEntry> {
        (0..self.tx.inputs.len())
            .map(|i| match i == self.input_index {
                true => UtxoEntry::new(self.input_amount, locking_script.clone()),
                false => UtxoEntry::new(0, ScriptPublicKey::default()),
            })
            .collect()
    }
}

/// A contract template bound to a transaction context, ready to be instantiated.
#[derive(Clone)]
pub struct ContractClass {
    template: Arc<ContractTemplate>,
    ctx: TxContext,
    flags: EngineFlags,
    sig_cache: Cache<SigCacheKey, bool>,
}

impl ContractClass {
    /// Binds `template` to `ctx` under the default [`Params`], which lift the legacy size limits.
    pub fn new(template: ContractTemplate, ctx: TxContext) -> Self {
        Self::with_params(template, ctx, &Params::default())
    }

    pub fn with_params(template: ContractTemplate, ctx: TxContext, params: &Params) -> Self {
        Self { template: Arc::new(template), ctx, flags: params.into(), sig_cache: Cache::new(params.sig_cache_size) }
    }

    pub fn load(path: impl AsRef<Path>, ctx: TxContext) -> Result<Self> {
        Ok(Self::new(ContractTemplate::load(path)?, ctx))
    }

    pub fn template(&self) -> &ContractTemplate {
        &self.template
    }

    pub fn context(&self) -> &TxContext {
        &self.ctx
    }

    /// Binds the constructor arguments, producing a contract with a fixed locking script.
    pub fn instantiate(&self, args: &[ContractArg]) -> Result<Contract> {
        let locking_script = ScriptPublicKey::from_vec(self.template.build_locking_script_with(self.flags.script_builder(), args)?);
        Ok(Contract {
            template: self.template.clone(),
            ctx: self.ctx.clone(),
            flags: self.flags,
            sig_cache: self.sig_cache.clone(),
            locking_script,
        })
    }
}

/// A contract instance. Verifying never mutates it, every call is evaluated against the same
/// locking script and transaction context.
#[derive(Clone)]
pub struct Contract {
    template: Arc<ContractTemplate>,
    ctx: TxContext,
    flags: EngineFlags,
    sig_cache: Cache<SigCacheKey, bool>,
    locking_script: ScriptPublicKey,
}

impl Contract {
    pub fn template(&self) -> &ContractTemplate {
        &self.template
    }

    pub fn context(&self) -> &TxContext {
        &self.ctx
    }

    pub fn locking_script(&self) -> &ScriptPublicKey {
        &self.locking_script
    }

    pub fn unlocking_script(&self, args: &[ContractArg]) -> Result<Vec<u8>> {
        self.template.build_unlocking_script_with(self.flags.script_builder(), args)
    }

    /// Signs the bound input with `SIGHASH_ALL|FORKID`, spending this contract's locking script.
    pub fn sign(&self, private_key: &PrivateKey) -> Result<Vec<u8>> {
        let populated_tx = PopulatedTransaction::new(&self.ctx.tx, self.ctx.entries(&self.locking_script));
        Ok(sign_input(&populated_tx, self.ctx.input_index, &private_key.secret_bytes(), SIG_HASH_ALL_FORK_ID)?)
    }

    /// Calls the public function with `args`, returning whether the bound input would be
    /// accepted. Any error, malformed arguments included, is a rejection.
    pub fn verify(&self, args: &[ContractArg]) -> bool {
        match self.verify_detailed(args) {
            Ok(()) => true,
            Err(err) => {
                debug!("{} rejected input {}: {}", self.template.name(), self.ctx.input_index, err);
                false
            }
        }
    }

    /// Like [`Contract::verify`], but reports why the input was rejected.
    pub fn verify_detailed(&self, args: &[ContractArg]) -> Result<()> {
        let idx = self.ctx.input_index;
        let mut tx = self.ctx.tx.clone();
        tx.inputs[idx].signature_script = self.unlocking_script(args)?;

        let utxo_entry = UtxoEntry::new(self.ctx.input_amount, self.locking_script.clone());
        let populated_tx = PopulatedTransaction::new(&tx, self.ctx.entries(&self.locking_script));
        let reused_values = SigHashReusedValuesUnsync::new();
        let mut vm = TxScriptEngine::from_transaction_input(
            &populated_tx,
            &tx.inputs[idx],
            idx,
            &utxo_entry,
            &reused_values,
            &self.sig_cache,
            self.flags,
        );
        Ok(vm.execute()?)
    }
}
