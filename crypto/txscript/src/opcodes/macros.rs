macro_rules! opcode_serde {
    ($length: literal) => {
        fn serialize(&self) -> Vec<u8> {
            core::iter::once(self.value()).chain(self.data.iter().copied()).collect()
        }

        fn deserialize<'i, I: Iterator<Item = &'i u8>, T: VerifiableTransaction, Reused: SigHashReusedValues>(
            it: &mut I,
        ) -> Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError> {
            // Static length includes the opcode itself
            let data: Vec<u8> = it.take($length - 1).copied().collect();
            <Self as OpCodeExecution<T, Reused>>::new(data)
        }
    };
    ($type:ty) => {
        fn serialize(&self) -> Vec<u8> {
            let length = self.data.len() as $type;
            [[self.value()].as_slice(), length.to_le_bytes().as_slice(), self.data.as_slice()].concat()
        }

        fn deserialize<'i, I: Iterator<Item = &'i u8>, T: VerifiableTransaction, Reused: SigHashReusedValues>(
            it: &mut I,
        ) -> Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError> {
            match it.take(size_of::<$type>()).copied().collect::<Vec<u8>>().try_into() {
                Ok(bytes) => {
                    let length = <$type>::from_le_bytes(bytes) as usize;
                    let data: Vec<u8> = it.take(length).copied().collect();
                    if data.len() != length {
                        return Err(TxScriptError::MalformedPush(length, data.len()));
                    }
                    <Self as OpCodeExecution<T, Reused>>::new(data)
                }
                Err(bytes) => Err(TxScriptError::MalformedPushSize(bytes)),
            }
        }
    };
}

macro_rules! opcode_init {
    ($length: literal) => {
        fn empty() -> Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError> {
            <Self as OpCodeExecution<T, Reused>>::new(vec![])
        }

        fn new(data: Vec<u8>) -> Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError> {
            if data.len() != $length - 1 {
                return Err(TxScriptError::MalformedPush($length - 1, data.len()));
            }
            Ok(Box::new(Self { data }))
        }
    };
    ($type:ty) => {
        fn empty() -> Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError> {
            <Self as OpCodeExecution<T, Reused>>::new(vec![])
        }

        fn new(data: Vec<u8>) -> Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError> {
            if data.len() > <$type>::MAX as usize {
                return Err(TxScriptError::MalformedPush(<$type>::MAX as usize, data.len()));
            }
            Ok(Box::new(Self { data }))
        }
    };
}

macro_rules! opcode_impl {
    ($name: ident, $num: literal, $length: tt, $code: expr, $self:ident, $vm:ident) => {
        type $name = OpCode<$num>;

        impl OpcodeSerialization for $name {
            opcode_serde!($length);
        }

        impl<T: VerifiableTransaction, Reused: SigHashReusedValues> OpCodeExecution<T, Reused> for $name {
            opcode_init!($length);

            #[allow(unused_variables)]
            fn execute(&$self, $vm: &mut TxScriptEngine<T, Reused>) -> OpCodeResult {
                $code
            }
        }

        impl<T: VerifiableTransaction, Reused: SigHashReusedValues> OpCodeImplementation<T, Reused> for $name {}
    };
}

macro_rules! opcode_list {
    ( $( opcode $(|$alias:ident|)? $name:ident<$num:literal, $length:tt>($self:ident, $vm:ident) $code: expr ) *)  => {
        pub mod codes {
            $(
                #[allow(non_upper_case_globals)]
                #[allow(dead_code)]
                pub const $name: u8 = $num;

                $(
                    #[allow(non_upper_case_globals)]
                    #[allow(dead_code)]
                    pub const $alias: u8 = $num;
                )?
            )*
        }

        /// Mnemonics indexed by opcode byte, as printed by the disassembler.
        pub(crate) const OPCODE_NAMES: [&str; 256] = {
            let mut names = [""; 256];
            $(
                names[$num] = stringify!($name);
            )*
            names
        };

        $(
            opcode_impl!($name, $num, $length, $code, $self, $vm);

            $(
                #[allow(dead_code)]
                type $alias = $name;
            )?
        )*

        pub fn deserialize_next_opcode<'i, I: Iterator<Item = &'i u8>, T: VerifiableTransaction, Reused: SigHashReusedValues>(
            it: &mut I,
        ) -> Option<Result<Box<dyn OpCodeImplementation<T, Reused>>, TxScriptError>> {
            match it.next() {
                Some(opcode_num) => match *opcode_num {
                    $(
                        $num => Some(<$name as OpcodeSerialization>::deserialize(it)),
                    )*
                },
                None => None,
            }
        }
    };
}
