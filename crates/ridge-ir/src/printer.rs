//! Plain-text dump of a function, for tests and debugging.

use std::fmt::Write;

use crate::func::Function;
use crate::node::Aux;
use crate::refs::{NodeRef, TypeRef};
use crate::types::TypeData;

fn type_name(f: &Function, ty: TypeRef) -> String {
    match *f.types.get(ty) {
        TypeData::Int { bits, signed } => {
            format!("{}{}", if signed { "i" } else { "u" }, bits)
        }
        TypeData::F32 => "f32".to_owned(),
        TypeData::F64 => "f64".to_owned(),
        TypeData::Bool => "bool".to_owned(),
        TypeData::Ptr => "ptr".to_owned(),
        TypeData::Mem => "mem".to_owned(),
        TypeData::Void => "void".to_owned(),
        TypeData::Pair(a, b) => format!("({}, {})", type_name(f, a), type_name(f, b)),
    }
}

fn print_node(out: &mut String, f: &Function, n: NodeRef) {
    let node = f.node(n);
    let _ = write!(out, "  {n} = {} <{}>", node.op, type_name(f, node.ty));
    if node.aux_int != 0 {
        let _ = write!(out, " [{}]", node.aux_int);
    }
    match node.aux {
        Aux::None => {}
        Aux::Sym(s) => {
            let _ = write!(out, " {{{}}}", f.syms.get(s).name);
        }
        Aux::Type(t) => {
            let _ = write!(out, " {{{}}}", type_name(f, t));
        }
    }
    if !node.args.is_empty() {
        let _ = write!(out, " (");
        for (i, a) in node.args.iter().enumerate() {
            if i > 0 {
                let _ = write!(out, ", ");
            }
            let _ = write!(out, "{a}");
        }
        let _ = write!(out, ")");
    }
    out.push('\n');
}

/// Render the whole function, one block per section.
pub fn print_function(f: &Function) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "fn {}:", f.name);
    for (b, block) in f.blocks.iter() {
        let _ = writeln!(out, "{b}:");
        for &n in &block.nodes {
            print_node(&mut out, f, n);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;
    use crate::node::Pos;
    use crate::op::Op;

    #[test]
    fn renders_ops_and_args() {
        let mut f = Function::new("demo", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Const32, f.cat.int32, Pos::default());
        f.set_aux_int(x, 41);
        let y = f.new_node(b, Op::Add32, f.cat.int32, Pos::default());
        f.add_args2(y, x, x);

        let text = print_function(&f);
        assert!(text.contains("fn demo:"));
        assert!(text.contains("Const32 <i32> [41]"));
        assert!(text.contains("Add32 <i32> (n0, n0)"));
    }
}
