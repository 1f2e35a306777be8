pub mod script {
    //!
    //! Limits enforced by the script engine while executing a spend.
    //!

    /// Maximum number of items on the data and alt stacks combined
    pub const MAX_STACK_SIZE: usize = 1000;

    /// Maximum size in bytes of each of the signature script and the locking script
    pub const MAX_SCRIPTS_SIZE: usize = 10_000;

    /// Maximum size in bytes of a single stack element
    pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

    /// Script and element size ceiling when the legacy size limits are lifted. A push
    /// carries at most a 4 byte length, so no element can be larger.
    pub const UNBOUNDED_SCRIPT_SIZE: usize = u32::MAX as usize;

    /// Maximum number of non-push operations per script
    pub const MAX_OPS_PER_SCRIPT: i32 = 500;

    /// Maximum length in bytes of a number popped from the stack
    pub const MAX_SCRIPT_NUM_LEN: usize = 4;
}

pub mod perf {
    //!
    //! Performance related defaults which do not affect validity.
    //!

    /// Default capacity of the signature verification cache
    pub const DEFAULT_SIG_CACHE_SIZE: u64 = 10_000;
}
