extern crate core;

pub mod caches;
pub mod contract;
mod data_stack;
pub mod opcodes;
pub mod script_builder;
pub mod script_class;
pub mod standard;
pub mod viewer;

use crate::caches::Cache;
use crate::data_stack::{DataStack, Stack};
use crate::opcodes::{deserialize_next_opcode, OpCodeImplementation, OpCond};
use crate::script_builder::ScriptBuilder;
use itertools::Itertools;
use log::trace;
use puzzle_consensus_core::config::constants::script::{MAX_OPS_PER_SCRIPT, MAX_SCRIPTS_SIZE, MAX_SCRIPT_ELEMENT_SIZE, MAX_STACK_SIZE};
use puzzle_consensus_core::config::params::Params;
use puzzle_consensus_core::hashing::sighash::{calc_ecdsa_signature_hash, SigHashReusedValues};
use puzzle_consensus_core::hashing::sighash_type::SigHashType;
use puzzle_consensus_core::sign::parse_der_low_s;
use puzzle_consensus_core::tx::{TransactionInput, UtxoEntry, VerifiableTransaction};
use secp256k1::{ecdsa, Message, PublicKey, SECP256K1};

pub use puzzle_txscript_errors::TxScriptError;
pub use standard::*;

pub const MAX_PUB_KEYS_PER_MULTISIG: i32 = 20;

// The last opcode that does not count toward operations.
// Note that this includes OP_RESERVED which counts as a push operation.
pub const NO_COST_OPCODE: u8 = 0x60;

type DynOpcodeImplementation<Tx, Reused> = Box<dyn OpCodeImplementation<Tx, Reused>>;

/// Policy switches of a single engine run. The default applies the legacy size limits,
/// while [`Params`] lift them unless configured otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineFlags {
    /// Require exactly one item on the data stack once all scripts ran
    pub enforce_clean_stack: bool,
    /// Maximum size in bytes of each script
    pub max_script_size: usize,
    /// Maximum size in bytes of a pushed element
    pub max_element_size: usize,
}

impl EngineFlags {
    /// A builder whose pushes stay within the size limits of these flags
    pub fn script_builder(&self) -> ScriptBuilder {
        ScriptBuilder::with_limits(self.max_script_size, self.max_element_size)
    }
}

impl Default for EngineFlags {
    fn default() -> Self {
        Self { enforce_clean_stack: true, max_script_size: MAX_SCRIPTS_SIZE, max_element_size: MAX_SCRIPT_ELEMENT_SIZE }
    }
}

impl From<&Params> for EngineFlags {
    fn from(params: &Params) -> Self {
        Self {
            enforce_clean_stack: params.enforce_clean_stack,
            max_script_size: params.max_script_size,
            max_element_size: params.max_script_element_size,
        }
    }
}

#[derive(Clone, Hash, PartialEq, Eq)]
pub struct SigCacheKey {
    signature: ecdsa::Signature,
    pub_key: PublicKey,
    message: Message,
}

enum ScriptSource<'a, T: VerifiableTransaction> {
    TxInput { tx: &'a T, input: &'a TransactionInput, idx: usize, utxo_entry: &'a UtxoEntry },
    StandAloneScripts(Vec<&'a [u8]>),
}

pub struct TxScriptEngine<'a, T: VerifiableTransaction, Reused: SigHashReusedValues> {
    dstack: Stack,
    astack: Stack,

    script_source: ScriptSource<'a, T>,

    // Outer caches for quicker calculation
    reused_values: &'a Reused,
    sig_cache: &'a Cache<SigCacheKey, bool>,

    cond_stack: Vec<OpCond>, // Following if stacks, and whether it is running

    num_ops: i32,
    flags: EngineFlags,
}

pub(crate) fn parse_script<T: VerifiableTransaction, Reused: SigHashReusedValues>(
    script: &[u8],
) -> impl Iterator<Item = Result<DynOpcodeImplementation<T, Reused>, TxScriptError>> + '_ {
    script.iter().batching(|it| deserialize_next_opcode(it))
}

impl<'a, T: VerifiableTransaction, Reused: SigHashReusedValues> TxScriptEngine<'a, T, Reused> {
    pub fn new(reused_values: &'a Reused, sig_cache: &'a Cache<SigCacheKey, bool>, flags: EngineFlags) -> Self {
        Self {
            dstack: vec![],
            astack: vec![],
            script_source: ScriptSource::StandAloneScripts(vec![]),
            reused_values,
            sig_cache,
            cond_stack: vec![],
            num_ops: 0,
            flags,
        }
    }

    /// Creates a new Script Engine for validating transaction input.
    ///
    /// # Arguments
    /// * `tx` - The transaction being validated
    /// * `input` - The input being validated
    /// * `input_idx` - Index of the input in the transaction
    /// * `utxo_entry` - UTXO entry being spent
    /// * `reused_values` - Reused values for signature hashing
    /// * `sig_cache` - Cache for signature verification
    /// * `flags` - Policy of this run
    ///
    /// An index out of range, or an input whose UTXO entry `tx` does not know, is reported
    /// by [`Self::execute`].
    pub fn from_transaction_input(
        tx: &'a T,
        input: &'a TransactionInput,
        input_idx: usize,
        utxo_entry: &'a UtxoEntry,
        reused_values: &'a Reused,
        sig_cache: &'a Cache<SigCacheKey, bool>,
        flags: EngineFlags,
    ) -> Self {
        Self {
            dstack: Default::default(),
            astack: Default::default(),
            script_source: ScriptSource::TxInput { tx, input, idx: input_idx, utxo_entry },
            reused_values,
            sig_cache,
            cond_stack: Default::default(),
            num_ops: 0,
            flags,
        }
    }

    pub fn from_script(
        script: &'a [u8],
        reused_values: &'a Reused,
        sig_cache: &'a Cache<SigCacheKey, bool>,
        flags: EngineFlags,
    ) -> Self {
        Self {
            dstack: Default::default(),
            astack: Default::default(),
            script_source: ScriptSource::StandAloneScripts(vec![script]),
            reused_values,
            sig_cache,
            cond_stack: Default::default(),
            num_ops: 0,
            flags,
        }
    }

    #[inline]
    pub fn is_executing(&self) -> bool {
        matches!(self.cond_stack.last(), None | Some(OpCond::True))
    }

    /// Translates a depth counted from the top of the data stack (0 being the top item) to
    /// an index into the stack.
    pub(crate) fn stack_depth_index(&self, loc: i32) -> Result<usize, TxScriptError> {
        let len = self.dstack.len();
        let Ok(loc) = usize::try_from(loc) else {
            return Err(TxScriptError::InvalidState(format!("negative stack depth {loc}")));
        };
        if loc >= len {
            return Err(TxScriptError::InvalidStackOperation(loc + 1, len));
        }
        Ok(len - loc - 1)
    }

    fn execute_opcode(&mut self, opcode: DynOpcodeImplementation<T, Reused>) -> Result<(), TxScriptError> {
        // Note that this includes OP_RESERVED which counts as a push operation.
        if !opcode.is_push_opcode() {
            self.num_ops += 1;
            if self.num_ops > MAX_OPS_PER_SCRIPT {
                return Err(TxScriptError::TooManyOperations(MAX_OPS_PER_SCRIPT));
            }
        } else if opcode.len() > self.flags.max_element_size {
            return Err(TxScriptError::ElementTooBig(opcode.len(), self.flags.max_element_size));
        }

        if self.is_executing() || opcode.is_conditional() {
            if opcode.value() > 0 && opcode.value() <= opcodes::codes::OpPushData4 {
                opcode.check_minimal_data_push()?;
            }
            opcode.execute(self)
        } else {
            Ok(())
        }
    }

    fn execute_script(&mut self, script: &[u8], verify_only_push: bool) -> Result<(), TxScriptError> {
        let script_result = parse_script(script).try_for_each(|opcode| {
            let opcode = opcode?;
            if opcode.is_disabled() {
                return Err(TxScriptError::OpcodeDisabled(format!("{:?}", opcode)));
            }

            if opcode.always_illegal() {
                return Err(TxScriptError::OpcodeReserved(format!("{:?}", opcode)));
            }

            if verify_only_push && !opcode.is_push_opcode() {
                return Err(TxScriptError::SignatureScriptNotPushOnly);
            }

            self.execute_opcode(opcode)?;

            let combined_size = self.astack.len() + self.dstack.len();
            if combined_size > MAX_STACK_SIZE {
                return Err(TxScriptError::StackSizeExceeded(combined_size, MAX_STACK_SIZE));
            }
            Ok(())
        });

        // Moving between scripts - we can't be inside an if
        if script_result.is_ok() && !self.cond_stack.is_empty() {
            return Err(TxScriptError::ErrUnbalancedConditional);
        }

        // Alt stack doesn't persist
        self.astack.clear();
        self.num_ops = 0; // number of ops is per script.

        if let Err(err) = &script_result {
            trace!("Script {} failed: {err}", hex::encode(script));
        }
        script_result
    }

    /// Runs the unlocking script then the locking script of the input (or the stand alone
    /// scripts in order) on a shared data stack.
    ///
    /// Returns `Ok(())` only when the run leaves a single true item on the stack, or at least
    /// one true item on top when clean stack is not enforced.
    pub fn execute(&mut self) -> Result<(), TxScriptError> {
        let (scripts, is_input) = match &self.script_source {
            ScriptSource::TxInput { tx, input, idx, utxo_entry } => {
                let num_inputs = tx.inputs().len();
                if *idx >= num_inputs || tx.utxo(*idx).is_none() {
                    return Err(TxScriptError::InvalidIndex(*idx, num_inputs));
                }
                (vec![input.signature_script.as_slice(), utxo_entry.script_public_key.script()], true)
            }
            ScriptSource::StandAloneScripts(scripts) => (scripts.clone(), false),
        };

        // When both the signature script and public key script are empty the
        // result is necessarily an error since the stack would end up being
        // empty which is equivalent to a false top element. Thus, just return
        // the relevant error now as an optimization.
        if scripts.is_empty() {
            return Err(TxScriptError::NoScripts);
        }

        if scripts.iter().all(|e| e.is_empty()) {
            return Err(TxScriptError::EvalFalse);
        }
        if let Some(s) = scripts.iter().find(|e| e.len() > self.flags.max_script_size) {
            return Err(TxScriptError::ScriptSize(s.len(), self.flags.max_script_size));
        }

        // try_for_each quits only if an error occurred. So, we always run over all scripts if
        // each is successful
        scripts
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .try_for_each(|(idx, s)| self.execute_script(s, is_input && idx == 0))?;

        self.check_error_condition()
    }

    // check_error_condition is called once all scripts ran. Returns Ok(()) if the run ended
    // successfully, leaving a true boolean on the stack. An error otherwise.
    #[inline]
    fn check_error_condition(&mut self) -> Result<(), TxScriptError> {
        if self.dstack.is_empty() {
            return Err(TxScriptError::EmptyStack);
        } else if self.flags.enforce_clean_stack && self.dstack.len() > 1 {
            return Err(TxScriptError::CleanStack(self.dstack.len() - 1));
        }

        let [v]: [bool; 1] = self.dstack.pop_items()?;
        match v {
            true => Ok(()),
            false => Err(TxScriptError::EvalFalse),
        }
    }

    // *** SIGNATURE SPECIFIC CODE **

    /// Accepts compressed (33 bytes, 0x02/0x03 prefix) and uncompressed (65 bytes, 0x04 prefix)
    /// SEC1 keys. Hybrid keys are rejected.
    fn check_pub_key_encoding(pub_key: &[u8]) -> Result<(), TxScriptError> {
        match (pub_key.len(), pub_key.first()) {
            (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => Ok(()),
            _ => Err(TxScriptError::PubKeyFormat),
        }
    }

    /// Parses a strict DER signature and rejects the malleable high-S form.
    fn parse_signature(sig: &[u8]) -> Result<ecdsa::Signature, TxScriptError> {
        parse_der_low_s(sig).map_err(|e| TxScriptError::SignatureFormat(e.to_string()))
    }

    pub(crate) fn check_ecdsa_signature(&mut self, hash_type: SigHashType, key: &[u8], sig: &[u8]) -> Result<bool, TxScriptError> {
        match self.script_source {
            ScriptSource::TxInput { tx, idx, .. } => {
                Self::check_pub_key_encoding(key)?;
                let pk = PublicKey::from_slice(key).map_err(TxScriptError::InvalidSignature)?;
                let sig = Self::parse_signature(sig)?;
                let sig_hash = calc_ecdsa_signature_hash(tx, idx, hash_type, self.reused_values);
                let msg = Message::from_digest(sig_hash.as_bytes());
                let sig_cache_key = SigCacheKey { signature: sig, pub_key: pk, message: msg };

                match self.sig_cache.get(&sig_cache_key) {
                    Some(valid) => Ok(valid),
                    None => {
                        let valid = SECP256K1.verify_ecdsa(&msg, &sig, &pk).is_ok();
                        self.sig_cache.insert(sig_cache_key, valid);
                        Ok(valid)
                    }
                }
            }
            _ => Err(TxScriptError::NotATransactionInput),
        }
    }

    /// Stack layout, top last: `<dummy> <sig 1> .. <sig m> <m> <key 1> .. <key n> <n>`.
    ///
    /// Signatures must appear in the same order as the keys they match. The dummy element
    /// consumed by the legacy off-by-one must be empty.
    pub(crate) fn op_check_multisig(&mut self) -> Result<(), TxScriptError> {
        let [num_keys]: [i32; 1] = self.dstack.pop_items()?;
        if !(0..=MAX_PUB_KEYS_PER_MULTISIG).contains(&num_keys) {
            return Err(TxScriptError::InvalidState(format!(
                "number of pubkeys {num_keys} is out of the range 0..={MAX_PUB_KEYS_PER_MULTISIG}"
            )));
        }
        let num_keys_usize = num_keys as usize;

        self.num_ops += num_keys;
        if self.num_ops > MAX_OPS_PER_SCRIPT {
            return Err(TxScriptError::TooManyOperations(MAX_OPS_PER_SCRIPT));
        }

        let pub_keys = match self.dstack.len() >= num_keys_usize {
            true => self.dstack.split_off(self.dstack.len() - num_keys_usize),
            false => return Err(TxScriptError::InvalidStackOperation(num_keys_usize, self.dstack.len())),
        };

        let [num_sigs]: [i32; 1] = self.dstack.pop_items()?;
        if !(0..=num_keys).contains(&num_sigs) {
            return Err(TxScriptError::InvalidState(format!("number of signatures {num_sigs} is out of the range 0..={num_keys}")));
        }
        let num_sigs = num_sigs as usize;

        let signatures = match self.dstack.len() >= num_sigs {
            true => self.dstack.split_off(self.dstack.len() - num_sigs),
            false => return Err(TxScriptError::InvalidStackOperation(num_sigs, self.dstack.len())),
        };

        let [dummy] = self.dstack.pop_raw()?;
        if !dummy.is_empty() {
            return Err(TxScriptError::InvalidState(format!("multisig dummy argument has length {} instead of 0", dummy.len())));
        }

        let mut success = true;
        let mut pub_key_iter = pub_keys.iter();
        'outer: for (sig_idx, signature) in signatures.iter().enumerate() {
            let Some((&typ, signature)) = signature.split_last() else {
                success = false;
                break;
            };
            let hash_type = SigHashType::from_u8(typ).map_err(|_| TxScriptError::InvalidSigHashType(typ))?;

            // Every check consumes a public key
            loop {
                // More signatures left than keys means some signature can never match
                if pub_key_iter.len() < num_sigs - sig_idx {
                    success = false;
                    break 'outer;
                }
                let Some(pub_key) = pub_key_iter.next() else {
                    success = false;
                    break 'outer;
                };
                if self.check_ecdsa_signature(hash_type, pub_key, signature)? {
                    break;
                }
            }
        }

        self.dstack.push_item(success);
        Ok(())
    }
}
