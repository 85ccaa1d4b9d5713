//! The `InsertionPoint`-style builder used by the lowerer (spec.md §6.2).
//!
//! Values are minted monotonically; blocks are appended in emission order and
//! never reordered, matching the deterministic-emission requirement of
//! spec.md §5. Every fallible operation goes through [`FunctionBuilder::invoke`],
//! which lazily creates (and thereafter reuses) the function's single landing
//! pad, per spec.md §4.10.

use super::attribute::Attribute;
use super::op::{Block, Function, Operation};
use super::types::Type;
use super::value::{BlockId, ValueId};

pub struct FunctionBuilder {
    name: String,
    params: Vec<(ValueId, Type)>,
    blocks: Vec<Block>,
    current: BlockId,
    next_value: u32,
    landing_pad: Option<(BlockId, ValueId)>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, param_types: &[Type]) -> Self {
        let mut builder = Self {
            name: name.into(),
            params: Vec::new(),
            blocks: Vec::new(),
            current: BlockId(0),
            next_value: 0,
            landing_pad: None,
        };
        let entry = builder.new_block();
        for &ty in param_types {
            let v = builder.new_value();
            builder.params.push((v, ty));
            builder.block_mut(entry).args.push((v, ty));
        }
        builder.current = entry;
        builder
    }

    pub fn new_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    /// # Panics
    /// Panics if the function accumulates more than `u32::MAX` blocks.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(u32::try_from(self.blocks.len()).expect("block count fits in a u32"));
        self.blocks.push(Block { id, args: Vec::new(), ops: Vec::new() });
        id
    }

    pub fn add_block_arg(&mut self, block: BlockId, ty: Type) -> ValueId {
        let v = self.new_value();
        self.block_mut(block).args.push((v, ty));
        v
    }

    pub fn set_insertion_block(&mut self, block: BlockId) {
        self.current = block;
    }

    #[must_use]
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    #[must_use]
    pub fn params(&self) -> &[(ValueId, Type)] {
        &self.params
    }

    /// Whether the current block already ends in a terminator. Lowering
    /// consults this before appending an implicit fallthrough so a block
    /// never ends up with two terminators.
    #[must_use]
    pub fn current_block_terminated(&self) -> bool {
        self.blocks[self.current.0 as usize].ops.last().is_some_and(Operation::is_terminator)
    }

    fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0 as usize]
    }

    /// Appends a non-terminator op producing `result_types` SSA results in
    /// the current block, returning their `ValueId`s in order.
    pub fn emit(
        &mut self,
        mnemonic: &'static str,
        operands: Vec<ValueId>,
        attributes: Vec<(&'static str, Attribute)>,
        result_types: &[Type],
    ) -> Vec<ValueId> {
        let results: Vec<(ValueId, Type)> = result_types.iter().map(|&ty| (self.new_value(), ty)).collect();
        let values = results.iter().map(|(v, _)| *v).collect();
        let current = self.current;
        self.block_mut(current)
            .ops
            .push(Operation { mnemonic, operands, attributes, results, successors: Vec::new() });
        values
    }

    /// Unconditional branch, forwarding `args` as the target block's arguments.
    pub fn br(&mut self, target: BlockId, args: Vec<ValueId>) {
        let current = self.current;
        self.block_mut(current).ops.push(Operation {
            mnemonic: "cf.br",
            operands: Vec::new(),
            attributes: Vec::new(),
            results: Vec::new(),
            successors: vec![(target, args)],
        });
    }

    /// Two-way branch on a boolean value (spec.md §4.7's truthiness test).
    pub fn cond_br(&mut self, cond: ValueId, then_blk: BlockId, else_blk: BlockId) {
        let current = self.current;
        self.block_mut(current).ops.push(Operation {
            mnemonic: "cf.cond_br",
            operands: vec![cond],
            attributes: Vec::new(),
            results: Vec::new(),
            successors: vec![(then_blk, Vec::new()), (else_blk, Vec::new())],
        });
    }

    /// Returns the function's shared landing pad, creating it on first use.
    /// The pad takes one argument: the thrown exception value.
    pub fn landing_pad(&mut self) -> (BlockId, ValueId) {
        if let Some(pad) = self.landing_pad {
            return pad;
        }
        let block = self.new_block();
        let arg = self.add_block_arg(block, Type::Value);
        self.landing_pad = Some((block, arg));
        (block, arg)
    }

    /// Whether the landing pad has been materialized yet (it is only emitted
    /// into the function if at least one fallible op used it).
    #[must_use]
    pub fn has_landing_pad(&self) -> bool {
        self.landing_pad.is_some()
    }

    /// Emits a fallible op (spec.md §4.5.1): one result, materialized in the
    /// current block, then a branch to a fresh normal-continuation block; on
    /// exception the same result slot is reinterpreted as the thrown value
    /// and forwarded to the landing pad's argument.
    ///
    /// Returns `(normal_block, result_value)`; the caller must switch
    /// insertion to `normal_block` before appending further ops.
    pub fn invoke(
        &mut self,
        mnemonic: &'static str,
        operands: Vec<ValueId>,
        attributes: Vec<(&'static str, Attribute)>,
    ) -> (BlockId, ValueId) {
        let (landing, _) = self.landing_pad();
        let result = self.new_value();
        let current = self.current;
        self.block_mut(current).ops.push(Operation {
            mnemonic,
            operands,
            attributes,
            results: vec![(result, Type::Value)],
            successors: Vec::new(),
        });
        let normal = self.new_block();
        let op_idx = self.block_mut(current).ops.len() - 1;
        debug_assert!(self.block_mut(current).ops[op_idx].successors.is_empty());
        self.block_mut(current).ops[op_idx].successors = vec![(normal, Vec::new()), (landing, vec![result])];
        self.current = normal;
        (normal, result)
    }

    /// `invoke_next` (spec.md §4.8): three-way split on one iterator-advance
    /// step. `continue_blk` receives `item` as its sole argument; `done_blk`
    /// receives none; the landing pad receives the thrown (non-`StopIteration`)
    /// exception.
    pub fn invoke_next(&mut self, iterator: ValueId) -> (BlockId, ValueId, BlockId) {
        let (landing, _) = self.landing_pad();
        let result = self.new_value();
        let current = self.current;
        let continue_blk = self.new_block();
        let item = self.add_block_arg(continue_blk, Type::Value);
        let done_blk = self.new_block();
        self.block_mut(current).ops.push(Operation {
            mnemonic: "scripting.invoke_next",
            operands: vec![iterator],
            attributes: Vec::new(),
            results: vec![(result, Type::Value)],
            successors: vec![(continue_blk, vec![item]), (done_blk, Vec::new()), (landing, vec![result])],
        });
        self.current = continue_blk;
        (continue_blk, item, done_blk)
    }

    /// Terminates the function on the normal-return path.
    pub fn scripting_return(&mut self, value: ValueId, raised: ValueId) {
        let current = self.current;
        self.block_mut(current).ops.push(Operation {
            mnemonic: "scripting.return",
            operands: vec![value, raised],
            attributes: Vec::new(),
            results: Vec::new(),
            successors: Vec::new(),
        });
    }

    #[must_use]
    pub fn finish(mut self) -> Function {
        if let Some((pad, exc)) = self.landing_pad {
            let raised = self.new_value();
            self.block_mut(pad).ops.push(Operation {
                mnemonic: "scripting.constant",
                operands: Vec::new(),
                attributes: vec![("value", Attribute::Bool(true))],
                results: vec![(raised, Type::I1)],
                successors: Vec::new(),
            });
            self.block_mut(pad).ops.push(Operation {
                mnemonic: "scripting.return",
                operands: vec![exc, raised],
                attributes: Vec::new(),
                results: Vec::new(),
                successors: Vec::new(),
            });
        }
        Function { name: self.name, params: self.params, blocks: self.blocks }
    }
}
