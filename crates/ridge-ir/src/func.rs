//! Function and block containers.
//!
//! `Function` owns the node arena, the block list, the type interner,
//! the symbol table, and the target configuration. All rewriting goes
//! through the mutators here: `reset` repurposes a slot in place,
//! `copy_of` turns a slot into a forwarding copy, and the `new_*`
//! builders append fresh helper nodes to a block. Nodes are never
//! destroyed; slots that fall out of use are left for downstream DCE.

use cranelift_entity::PrimaryMap;
use smallvec::SmallVec;

use crate::config::TargetConfig;
use crate::node::{Aux, NodeData, Pos};
use crate::op::Op;
use crate::refs::{BlockRef, NodeRef, TypeRef};
use crate::sym::SymbolTable;
use crate::types::{TypeCatalog, TypeInterner};

#[derive(Debug, Default)]
pub struct BlockData {
    /// Nodes owned by this block. Order is not meaningful before
    /// scheduling; helpers are appended at the end.
    pub nodes: Vec<NodeRef>,
}

#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub cfg: TargetConfig,
    pub types: TypeInterner,
    pub cat: TypeCatalog,
    pub syms: SymbolTable,
    nodes: PrimaryMap<NodeRef, NodeData>,
    pub blocks: PrimaryMap<BlockRef, BlockData>,
}

impl Function {
    pub fn new(name: impl Into<String>, cfg: TargetConfig) -> Self {
        let mut types = TypeInterner::new();
        let cat = TypeCatalog::build(&mut types);
        Self {
            name: name.into(),
            cfg,
            types,
            cat,
            syms: SymbolTable::new(),
            nodes: PrimaryMap::new(),
            blocks: PrimaryMap::new(),
        }
    }

    pub fn add_block(&mut self) -> BlockRef {
        self.blocks.push(BlockData::default())
    }

    // === Queries ===

    pub fn node(&self, n: NodeRef) -> &NodeData {
        &self.nodes[n]
    }

    pub fn node_mut(&mut self, n: NodeRef) -> &mut NodeData {
        &mut self.nodes[n]
    }

    pub fn op(&self, n: NodeRef) -> Op {
        self.nodes[n].op
    }

    pub fn ty(&self, n: NodeRef) -> TypeRef {
        self.nodes[n].ty
    }

    pub fn args(&self, n: NodeRef) -> &[NodeRef] {
        &self.nodes[n].args
    }

    pub fn arg(&self, n: NodeRef, i: usize) -> NodeRef {
        self.nodes[n].args[i]
    }

    pub fn aux_int(&self, n: NodeRef) -> i64 {
        self.nodes[n].aux_int
    }

    pub fn block_of(&self, n: NodeRef) -> BlockRef {
        self.nodes[n].block
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_refs(&self) -> impl Iterator<Item = NodeRef> + use<> {
        self.nodes.keys()
    }

    // === Builders ===

    /// Append a fresh node to `block`.
    pub fn new_node(&mut self, block: BlockRef, op: Op, ty: TypeRef, pos: Pos) -> NodeRef {
        let n = self.nodes.push(NodeData {
            op,
            ty,
            aux_int: 0,
            aux: Aux::None,
            args: SmallVec::new(),
            pos,
            block,
        });
        self.blocks[block].nodes.push(n);
        n
    }

    /// Fresh helper node in the same block and at the same position as
    /// `at`. This is the builder the rewrite rules use.
    pub fn helper(&mut self, at: NodeRef, op: Op, ty: TypeRef) -> NodeRef {
        let block = self.nodes[at].block;
        let pos = self.nodes[at].pos;
        self.new_node(block, op, ty, pos)
    }

    pub fn helper1(&mut self, at: NodeRef, op: Op, ty: TypeRef, a: NodeRef) -> NodeRef {
        let n = self.helper(at, op, ty);
        self.nodes[n].args.push(a);
        n
    }

    pub fn helper2(&mut self, at: NodeRef, op: Op, ty: TypeRef, a: NodeRef, b: NodeRef) -> NodeRef {
        let n = self.helper(at, op, ty);
        self.nodes[n].args.extend([a, b]);
        n
    }

    pub fn helper3(
        &mut self,
        at: NodeRef,
        op: Op,
        ty: TypeRef,
        a: NodeRef,
        b: NodeRef,
        c: NodeRef,
    ) -> NodeRef {
        let n = self.helper(at, op, ty);
        self.nodes[n].args.extend([a, b, c]);
        n
    }

    /// Fresh `I32Const` helper, value stored sign-extended.
    pub fn iconst(&mut self, at: NodeRef, c: u32) -> NodeRef {
        let n = self.helper(at, Op::I32Const, self.cat.uint32);
        self.nodes[n].aux_int = c as i32 as i64;
        n
    }

    /// The only legal way to build a two-word pseudo op: one tuple node
    /// plus exactly one `Select0` (hi) and one `Select1` (lo).
    pub fn pair64(
        &mut self,
        at: NodeRef,
        op: Op,
        xhi: NodeRef,
        xlo: NodeRef,
        yhi: NodeRef,
        ylo: NodeRef,
    ) -> Pair64 {
        debug_assert!(op.is_lowered_pair(), "pair64 on non-pair opcode {op}");
        let tuple = self.helper(at, op, self.cat.uint32_pair);
        self.nodes[tuple].args.extend([xhi, xlo, yhi, ylo]);
        let hi = self.helper1(at, Op::Select0, self.cat.uint32, tuple);
        let lo = self.helper1(at, Op::Select1, self.cat.uint32, tuple);
        Pair64 { tuple, hi, lo }
    }

    // === Mutators ===

    /// Repurpose the slot for a new opcode: clears payloads and
    /// arguments, keeps type, position, and block.
    pub fn reset(&mut self, n: NodeRef, op: Op) {
        let node = &mut self.nodes[n];
        node.op = op;
        node.aux_int = 0;
        node.aux = Aux::None;
        node.args.clear();
    }

    /// Turn the slot into a forwarding copy of `src`.
    pub fn copy_of(&mut self, n: NodeRef, src: NodeRef) {
        debug_assert_ne!(n, src, "copy_of to itself");
        self.reset(n, Op::Copy);
        self.nodes[n].args.push(src);
    }

    pub fn set_ty(&mut self, n: NodeRef, ty: TypeRef) {
        self.nodes[n].ty = ty;
    }

    pub fn set_aux_int(&mut self, n: NodeRef, aux_int: i64) {
        self.nodes[n].aux_int = aux_int;
    }

    pub fn set_aux(&mut self, n: NodeRef, aux: Aux) {
        self.nodes[n].aux = aux;
    }

    pub fn add_arg(&mut self, n: NodeRef, a: NodeRef) {
        self.nodes[n].args.push(a);
    }

    pub fn add_args2(&mut self, n: NodeRef, a: NodeRef, b: NodeRef) {
        self.nodes[n].args.extend([a, b]);
    }

    pub fn add_args3(&mut self, n: NodeRef, a: NodeRef, b: NodeRef, c: NodeRef) {
        self.nodes[n].args.extend([a, b, c]);
    }

    pub fn set_arg(&mut self, n: NodeRef, i: usize, a: NodeRef) {
        self.nodes[n].args[i] = a;
    }
}

/// Result of `Function::pair64`.
#[derive(Debug, Clone, Copy)]
pub struct Pair64 {
    pub tuple: NodeRef,
    /// `Select0` of the tuple: the high word.
    pub hi: NodeRef,
    /// `Select1` of the tuple: the low word.
    pub lo: NodeRef,
}
