//! Lowers an analyzed [`ir::Root`] to the TAC stream.
//!
//! Runs only on a clean analysis, so it never diagnoses: every reference
//! already carries its symbol, every offset is closed. The generator owns
//! the storage model (global slots, frame offsets, parameter indices) and
//! the per-function temporary and label counters.

pub mod parser;

use std::collections::HashMap;

use crate::ir::{self, FunctionId, SymbolId};
use crate::tac::{BinOp, Function, Instr, Label, Place, Program, UnOp, Value};

/// Every storage slot is 4 bytes: integers, booleans as 0/1, references and
/// strings as addresses.
const SLOT_SIZE: u32 = 4;

pub fn build_from_root(root: &ir::Root) -> Program {
    let mut generator = Generator::new(root);
    generator.assign_global_slots();
    for id in 0..root.functions.len() {
        generator.emit_function(FunctionId(id));
    }
    generator.emit_main();
    generator.program
}

struct Generator<'a> {
    root: &'a ir::Root,
    program: Program,
    globals: HashMap<SymbolId, u32>,
    global_offset: u32,

    // per-function state, reset at every function boundary
    body: Vec<Instr>,
    frame: HashMap<SymbolId, i32>,
    local_offset: u32,
    in_main: bool,
    temp: u32,
    if_k: u32,
    while_k: u32,
    do_k: u32,
    switch_k: u32,
    cont_k: u32,
    break_targets: Vec<Label>,
    continue_targets: Vec<Label>,
}

impl<'a> Generator<'a> {
    fn new(root: &'a ir::Root) -> Self {
        Self {
            root,
            program: Program::default(),
            globals: HashMap::new(),
            global_offset: 0,
            body: Vec::new(),
            frame: HashMap::new(),
            local_offset: 0,
            in_main: false,
            temp: 0,
            if_k: 0,
            while_k: 0,
            do_k: 0,
            switch_k: 0,
            cont_k: 0,
            break_targets: Vec::new(),
            continue_targets: Vec::new(),
        }
    }

    fn reset_function_state(&mut self, in_main: bool) {
        self.body.clear();
        self.frame.clear();
        self.local_offset = 0;
        self.in_main = in_main;
        self.temp = 0;
        self.if_k = 0;
        self.while_k = 0;
        self.do_k = 0;
        self.switch_k = 0;
        self.cont_k = 0;
        self.break_targets.clear();
        self.continue_targets.clear();
    }

    /// Global slots go to every binding declared in global statements, in
    /// declaration order.
    fn assign_global_slots(&mut self) {
        fn scan(generator: &mut Generator, stmts: &[ir::StmtNode]) {
            for stmt in stmts {
                match &stmt.stmt {
                    ir::Stmt::Decl { symbol, .. } => generator.new_global_slot(*symbol),
                    ir::Stmt::If {
                        then_branch,
                        else_branch,
                        ..
                    } => {
                        scan(generator, &then_branch.stmts);
                        if let Some(else_branch) = else_branch {
                            scan(generator, &else_branch.stmts);
                        }
                    }
                    ir::Stmt::While { body, .. } | ir::Stmt::DoWhile { body, .. } => {
                        scan(generator, &body.stmts)
                    }
                    ir::Stmt::Foreach { element, body, .. } => {
                        generator.new_global_slot(*element);
                        scan(generator, &body.stmts);
                    }
                    ir::Stmt::Switch { cases, .. } => {
                        for case in cases {
                            match &case.data {
                                ir::SwitchCaseData::Case { body, .. }
                                | ir::SwitchCaseData::Default { body } => scan(generator, body),
                            }
                        }
                    }
                    ir::Stmt::Try { try_block, .. } => scan(generator, &try_block.stmts),
                    ir::Stmt::Block(block) => scan(generator, &block.stmts),
                    _ => {}
                }
            }
        }
        let root = self.root;
        scan(self, &root.globals);
    }

    fn new_global_slot(&mut self, symbol: SymbolId) {
        let offset = self.global_offset;
        self.global_offset += SLOT_SIZE;
        self.globals.insert(symbol, offset);
    }

    fn new_local_slot(&mut self, symbol: SymbolId) -> Place {
        if self.in_main {
            // top-level bindings live in global storage
            if !self.globals.contains_key(&symbol) {
                self.new_global_slot(symbol);
            }
            Place::Global(self.globals[&symbol])
        } else {
            let offset = self.local_offset as i32;
            self.local_offset += SLOT_SIZE;
            self.frame.insert(symbol, offset);
            Place::Frame(offset)
        }
    }

    /// A nameless data slot (the foreach index variable).
    fn new_scratch_slot(&mut self) -> Place {
        if self.in_main {
            let offset = self.global_offset;
            self.global_offset += SLOT_SIZE;
            Place::Global(offset)
        } else {
            let offset = self.local_offset as i32;
            self.local_offset += SLOT_SIZE;
            Place::Frame(offset)
        }
    }

    fn place_for(&self, symbol: SymbolId) -> Place {
        if let Some(&slot) = self.frame.get(&symbol) {
            Place::Frame(slot)
        } else if let Some(&offset) = self.globals.get(&symbol) {
            Place::Global(offset)
        } else {
            unreachable!("ICE: symbol without assigned storage")
        }
    }

    fn push(&mut self, instr: Instr) {
        self.body.push(instr);
    }

    fn fresh_temp(&mut self) -> Place {
        let t = Place::Temp(self.temp);
        self.temp += 1;
        t
    }

    /// Conditions must be tested through a temporary.
    fn ensure_temp(&mut self, value: Value) -> Place {
        if let Value::Place(place @ Place::Temp(_)) = value {
            return place;
        }
        let t = self.fresh_temp();
        self.push(Instr::Copy {
            dst: t.clone(),
            src: value,
        });
        t
    }

    /// Indexing needs a place as base; copies literals and `R` out first.
    fn as_place(&mut self, value: Value) -> Place {
        if let Value::Place(place) = value {
            return place;
        }
        self.ensure_temp(value)
    }

    fn label(&mut self, label: &Label) {
        self.push(Instr::Label(label.clone()));
    }

    fn goto(&mut self, label: &Label) {
        self.push(Instr::Goto(label.clone()));
    }

    // ==== functions ====

    fn emit_function(&mut self, id: FunctionId) {
        let root = self.root;
        let item = root.function(id);
        let Some(body) = &item.body else { return };

        self.reset_function_state(false);

        // parameters: fp[-1] is `this` for methods, then the declared
        // parameters in order
        let mut slot = -1;
        if let Some(this) = item.this_symbol {
            self.frame.insert(this, slot);
            slot -= 1;
        }
        for &param in &item.param_symbols {
            self.frame.insert(param, slot);
            slot -= 1;
        }

        for stmt in &body.stmts {
            self.stmt(stmt);
        }
        self.ensure_return();

        let function = Function {
            name: item.codegen_name(root),
            body: std::mem::take(&mut self.body),
        };
        self.program.functions.push(function);
    }

    /// Global statements run in a synthetic `main`, placed after all named
    /// functions.
    fn emit_main(&mut self) {
        self.reset_function_state(true);
        let root = self.root;
        for stmt in &root.globals {
            self.stmt(stmt);
        }
        self.ensure_return();
        let function = Function {
            name: "main".to_owned(),
            body: std::mem::take(&mut self.body),
        };
        self.program.functions.push(function);
    }

    fn ensure_return(&mut self) {
        if !matches!(self.body.last(), Some(Instr::Return(_))) {
            self.push(Instr::Return(None));
        }
    }

    // ==== statements ====

    fn block(&mut self, block: &ir::BlockNode) {
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &ir::StmtNode) {
        match &stmt.stmt {
            ir::Stmt::Expr(e) => self.expr_effect(e),
            ir::Stmt::Decl { symbol, init } => {
                let slot = self.new_local_slot(*symbol);
                if let Some(init) = init {
                    let value = self.expr_value(init);
                    self.push(Instr::Copy {
                        dst: slot,
                        src: value,
                    });
                }
            }
            ir::Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_stmt(condition, then_branch, else_branch.as_ref()),
            ir::Stmt::While {
                condition,
                body,
                continuation,
            } => self.while_stmt(condition, body, continuation.as_ref()),
            ir::Stmt::DoWhile { body, condition } => self.do_while_stmt(body, condition),
            ir::Stmt::Foreach {
                element,
                iterable,
                body,
            } => self.foreach_stmt(*element, iterable, body),
            ir::Stmt::Switch { scrutinee, cases } => self.switch_stmt(scrutinee, cases),
            ir::Stmt::Break => {
                let target = self
                    .break_targets
                    .last()
                    .cloned()
                    .expect("ICE: break without a target");
                self.goto(&target);
            }
            ir::Stmt::Continue => {
                let target = self
                    .continue_targets
                    .last()
                    .cloned()
                    .expect("ICE: continue without a target");
                self.goto(&target);
            }
            ir::Stmt::Return(value) => {
                let value = value.as_ref().map(|v| self.expr_value(v));
                self.push(Instr::Return(value));
            }
            ir::Stmt::Print(e) => {
                let value = self.expr_value(e);
                self.push(Instr::Param(value));
                self.push(Instr::Call {
                    callee: "print".to_owned(),
                    argc: 1,
                });
            }
            // no throw exists, so the catch block is unreachable
            ir::Stmt::Try { try_block, .. } => self.block(try_block),
            ir::Stmt::Block(block) => self.block(block),
        }
    }

    fn if_stmt(
        &mut self,
        condition: &ir::ExprNode,
        then_branch: &ir::BlockNode,
        else_branch: Option<&ir::BlockNode>,
    ) {
        let k = self.if_k;
        self.if_k += 1;
        let true_label = Label(format!("IF_TRUE_{k}"));
        let false_label = Label(format!("IF_FALSE_{k}"));
        let end_label = Label(format!("IF_END_{k}"));

        // without an else the false label collapses into the end label
        let false_target = if else_branch.is_some() {
            &false_label
        } else {
            &end_label
        };
        self.cond(condition, &true_label, false_target);

        self.label(&true_label);
        self.block(then_branch);
        if let Some(else_branch) = else_branch {
            self.goto(&end_label);
            self.label(&false_label);
            self.block(else_branch);
        }
        self.label(&end_label);
    }

    fn while_stmt(
        &mut self,
        condition: &ir::ExprNode,
        body: &ir::BlockNode,
        continuation: Option<&ir::ExprNode>,
    ) {
        let k = self.while_k;
        self.while_k += 1;
        let start = Label(format!("STARTWHILE_{k}"));
        let body_label = Label(format!("LABEL_TRUE_{k}"));
        let end = Label(format!("ENDWHILE_{k}"));

        self.label(&start);
        let cond = self.expr_value(condition);
        let cond = self.ensure_temp(cond);
        self.push(Instr::IfGoto {
            cond: Value::Place(cond),
            target: body_label.clone(),
        });
        self.goto(&end);

        self.label(&body_label);
        self.break_targets.push(end.clone());
        self.continue_targets.push(start.clone());
        self.block(body);
        if let Some(step) = continuation {
            self.expr_effect(step);
        }
        self.break_targets.pop();
        self.continue_targets.pop();
        self.goto(&start);
        self.label(&end);
    }

    fn do_while_stmt(&mut self, body: &ir::BlockNode, condition: &ir::ExprNode) {
        let k = self.do_k;
        self.do_k += 1;
        let start = Label(format!("STARTDO_{k}"));
        let cond_label = Label(format!("DOCOND_{k}"));
        let end = Label(format!("ENDDO_{k}"));

        self.label(&start);
        self.break_targets.push(end.clone());
        self.continue_targets.push(cond_label.clone());
        self.block(body);
        self.break_targets.pop();
        self.continue_targets.pop();

        self.label(&cond_label);
        let cond = self.expr_value(condition);
        let cond = self.ensure_temp(cond);
        self.push(Instr::IfGoto {
            cond: Value::Place(cond),
            target: start,
        });
        self.label(&end);
    }

    /// Foreach is the standard while over a materialized index, bounded by
    /// the `len` backend intrinsic.
    fn foreach_stmt(&mut self, element: SymbolId, iterable: &ir::ExprNode, body: &ir::BlockNode) {
        let array = self.expr_value(iterable);
        let array = self.as_place(array);

        self.push(Instr::Param(Value::Place(array.clone())));
        self.push(Instr::Call {
            callee: "len".to_owned(),
            argc: 1,
        });
        let length = self.fresh_temp();
        self.push(Instr::Copy {
            dst: length.clone(),
            src: Value::R,
        });

        let index = self.new_scratch_slot();
        self.push(Instr::Copy {
            dst: index.clone(),
            src: Value::Int(0),
        });

        let k = self.while_k;
        self.while_k += 1;
        let start = Label(format!("STARTWHILE_{k}"));
        let body_label = Label(format!("LABEL_TRUE_{k}"));
        let end = Label(format!("ENDWHILE_{k}"));

        self.label(&start);
        let in_bounds = self.fresh_temp();
        self.push(Instr::Binary {
            dst: in_bounds.clone(),
            lhs: Value::Place(index.clone()),
            op: BinOp::Lt,
            rhs: Value::Place(length),
        });
        self.push(Instr::IfGoto {
            cond: Value::Place(in_bounds),
            target: body_label.clone(),
        });
        self.goto(&end);

        self.label(&body_label);
        let element_slot = self.new_local_slot(element);
        self.push(Instr::Copy {
            dst: element_slot,
            src: Value::Place(Place::Index(
                Box::new(array),
                Box::new(Value::Place(index.clone())),
            )),
        });

        self.break_targets.push(end.clone());
        self.continue_targets.push(start.clone());
        self.block(body);
        self.break_targets.pop();
        self.continue_targets.pop();

        let next = self.fresh_temp();
        self.push(Instr::Binary {
            dst: next.clone(),
            lhs: Value::Place(index.clone()),
            op: BinOp::Add,
            rhs: Value::Int(1),
        });
        self.push(Instr::Copy {
            dst: index,
            src: Value::Place(next),
        });
        self.goto(&start);
        self.label(&end);
    }

    /// Sequential equality tests; bodies fall through; `break` jumps to the
    /// end label; default is tried last.
    fn switch_stmt(&mut self, scrutinee: &ir::ExprNode, cases: &[ir::SwitchCaseNode]) {
        let k = self.switch_k;
        self.switch_k += 1;
        let end = Label(format!("ENDSWITCH_{k}"));
        let default_label = Label(format!("DEFAULT_{k}"));
        let has_default = cases
            .iter()
            .any(|c| matches!(c.data, ir::SwitchCaseData::Default { .. }));

        let scrutinee = self.expr_value(scrutinee);
        let scrutinee = self.ensure_temp(scrutinee);

        let mut case_index = 0usize;
        for case in cases {
            if let ir::SwitchCaseData::Case { value, .. } = &case.data {
                let label = Label(format!("CASE_{k}_{case_index}"));
                case_index += 1;
                let value = self.expr_value(value);
                let hit = self.fresh_temp();
                self.push(Instr::Binary {
                    dst: hit.clone(),
                    lhs: Value::Place(scrutinee.clone()),
                    op: BinOp::Eq,
                    rhs: value,
                });
                self.push(Instr::IfGoto {
                    cond: Value::Place(hit),
                    target: label,
                });
            }
        }
        self.goto(if has_default { &default_label } else { &end });

        self.break_targets.push(end.clone());
        let mut case_index = 0usize;
        for case in cases {
            match &case.data {
                ir::SwitchCaseData::Case { body, .. } => {
                    let label = Label(format!("CASE_{k}_{case_index}"));
                    case_index += 1;
                    self.label(&label);
                    for stmt in body {
                        self.stmt(stmt);
                    }
                }
                ir::SwitchCaseData::Default { body } => {
                    self.label(&default_label);
                    for stmt in body {
                        self.stmt(stmt);
                    }
                }
            }
        }
        self.break_targets.pop();
        self.label(&end);
    }

    // ==== expressions ====

    /// Value context: evaluates left-to-right post-order, one fresh
    /// temporary per subexpression result.
    fn expr_value(&mut self, e: &ir::ExprNode) -> Value {
        match &e.expr {
            ir::Expr::Constant(c) => constant_value(c),
            ir::Expr::Var(symbol) | ir::Expr::This(symbol) => {
                Value::Place(self.place_for(*symbol))
            }
            ir::Expr::ArrayLiteral(elements) => {
                let values: Vec<Value> = elements.iter().map(|el| self.expr_value(el)).collect();
                self.push(Instr::Param(Value::Int(values.len() as i64)));
                self.push(Instr::Call {
                    callee: "newarray".to_owned(),
                    argc: 1,
                });
                let array = self.fresh_temp();
                self.push(Instr::Copy {
                    dst: array.clone(),
                    src: Value::R,
                });
                for (index, value) in values.into_iter().enumerate() {
                    self.push(Instr::Copy {
                        dst: Place::Index(
                            Box::new(array.clone()),
                            Box::new(Value::Int(index as i64)),
                        ),
                        src: value,
                    });
                }
                Value::Place(array)
            }
            ir::Expr::Assign(target, value) => {
                let value = self.expr_value(value);
                let place = self.place(target);
                self.push(Instr::Copy {
                    dst: place,
                    src: value.clone(),
                });
                value
            }
            ir::Expr::Ternary(condition, then_branch, else_branch) => {
                let k = self.if_k;
                self.if_k += 1;
                let true_label = Label(format!("IF_TRUE_{k}"));
                let false_label = Label(format!("IF_FALSE_{k}"));
                let end_label = Label(format!("IF_END_{k}"));
                let out = self.fresh_temp();

                self.cond(condition, &true_label, &false_label);
                self.label(&true_label);
                let then_value = self.expr_value(then_branch);
                self.push(Instr::Copy {
                    dst: out.clone(),
                    src: then_value,
                });
                self.goto(&end_label);
                self.label(&false_label);
                let else_value = self.expr_value(else_branch);
                self.push(Instr::Copy {
                    dst: out.clone(),
                    src: else_value,
                });
                self.label(&end_label);
                Value::Place(out)
            }
            ir::Expr::Binary(lhs, op, rhs) => {
                let lhs = self.expr_value(lhs);
                let rhs = self.expr_value(rhs);
                let out = self.fresh_temp();
                self.push(Instr::Binary {
                    dst: out.clone(),
                    lhs,
                    op: binop(*op),
                    rhs,
                });
                Value::Place(out)
            }
            ir::Expr::Logical(lhs, op, rhs) => self.logical_value(lhs, *op, rhs),
            ir::Expr::Unary(op, inner) => {
                let inner = self.expr_value(inner);
                let out = self.fresh_temp();
                self.push(Instr::Unary {
                    dst: out.clone(),
                    op: match op {
                        ir::UnaryOp::Neg => UnOp::Neg,
                        ir::UnaryOp::Not => UnOp::Not,
                    },
                    src: inner,
                });
                Value::Place(out)
            }
            ir::Expr::Index(base, index) => {
                let base = self.expr_value(base);
                let base = self.as_place(base);
                let index = self.expr_value(index);
                let out = self.fresh_temp();
                self.push(Instr::Copy {
                    dst: out.clone(),
                    src: Value::Place(Place::Index(Box::new(base), Box::new(index))),
                });
                Value::Place(out)
            }
            ir::Expr::Field { object, offset, .. } => {
                let object = self.expr_value(object);
                let object = self.as_place(object);
                let out = self.fresh_temp();
                self.push(Instr::Copy {
                    dst: out.clone(),
                    src: Value::Place(Place::Index(
                        Box::new(object),
                        Box::new(Value::Int(*offset as i64)),
                    )),
                });
                Value::Place(out)
            }
            ir::Expr::Call { callee, args } => {
                self.emit_call(None, *callee, args);
                self.copy_result()
            }
            ir::Expr::MethodCall {
                receiver,
                callee,
                args,
            } => {
                self.emit_call(Some(receiver), *callee, args);
                self.copy_result()
            }
            ir::Expr::New { class, args } => {
                self.emit_new(*class, args);
                self.copy_result()
            }
        }
    }

    /// Statement context: calls don't copy `R` into a temporary.
    fn expr_effect(&mut self, e: &ir::ExprNode) {
        match &e.expr {
            ir::Expr::Call { callee, args } => self.emit_call(None, *callee, args),
            ir::Expr::MethodCall {
                receiver,
                callee,
                args,
            } => self.emit_call(Some(receiver), *callee, args),
            ir::Expr::New { class, args } => self.emit_new(*class, args),
            _ => {
                self.expr_value(e);
            }
        }
    }

    fn copy_result(&mut self) -> Value {
        let out = self.fresh_temp();
        self.push(Instr::Copy {
            dst: out.clone(),
            src: Value::R,
        });
        Value::Place(out)
    }

    /// `PARAM` receiver first, then arguments leftmost-first, then `CALL`.
    fn emit_call(&mut self, receiver: Option<&ir::ExprNode>, callee: FunctionId, args: &[ir::ExprNode]) {
        let receiver = receiver.map(|r| self.expr_value(r));
        let args: Vec<Value> = args.iter().map(|a| self.expr_value(a)).collect();

        let mut argc = args.len();
        if let Some(receiver) = receiver {
            argc += 1;
            self.push(Instr::Param(receiver));
        }
        for arg in args {
            self.push(Instr::Param(arg));
        }
        self.push(Instr::Call {
            callee: self.root.function(callee).codegen_name(self.root),
            argc,
        });
    }

    /// `new C(args)`: the backend's `newC` allocates and dispatches the
    /// constructor; the object address lands in `R`.
    fn emit_new(&mut self, class: ir::ClassId, args: &[ir::ExprNode]) {
        let args: Vec<Value> = args.iter().map(|a| self.expr_value(a)).collect();
        let argc = args.len();
        for arg in args {
            self.push(Instr::Param(arg));
        }
        self.push(Instr::Call {
            callee: format!("new{}", self.root.class(class).name),
            argc,
        });
    }

    /// Value context for `&&`/`||`: a temporary set to 0 or 1 around the
    /// `*_CONT_k` label structure, still skipping the right side.
    fn logical_value(&mut self, lhs: &ir::ExprNode, op: ir::LogicalOp, rhs: &ir::ExprNode) -> Value {
        let k = self.cont_k;
        self.cont_k += 1;
        let out = self.fresh_temp();
        match op {
            ir::LogicalOp::And => {
                let cont = Label(format!("AND_CONT_{k}"));
                let end = Label(format!("AND_END_{k}"));
                let lhs = self.expr_value(lhs);
                let lhs = self.ensure_temp(lhs);
                self.push(Instr::Copy {
                    dst: out.clone(),
                    src: Value::Int(0),
                });
                self.push(Instr::IfGoto {
                    cond: Value::Place(lhs),
                    target: cont.clone(),
                });
                self.goto(&end);
                self.label(&cont);
                let rhs = self.expr_value(rhs);
                self.push(Instr::Copy {
                    dst: out.clone(),
                    src: rhs,
                });
                self.label(&end);
            }
            ir::LogicalOp::Or => {
                let cont = Label(format!("OR_CONT_{k}"));
                let end = Label(format!("OR_END_{k}"));
                let lhs = self.expr_value(lhs);
                let lhs = self.ensure_temp(lhs);
                self.push(Instr::Copy {
                    dst: out.clone(),
                    src: Value::Int(1),
                });
                self.push(Instr::IfGoto {
                    cond: Value::Place(lhs),
                    target: end.clone(),
                });
                self.label(&cont);
                let rhs = self.expr_value(rhs);
                self.push(Instr::Copy {
                    dst: out.clone(),
                    src: rhs,
                });
                self.label(&end);
            }
        }
        Value::Place(out)
    }

    /// Control context for booleans: jump to one of the two labels, never
    /// materializing a 0/1 value. `!` swaps the targets; `&&`/`||` chain
    /// through `AND_CONT_k`/`OR_CONT_k`.
    fn cond(&mut self, e: &ir::ExprNode, true_label: &Label, false_label: &Label) {
        match &e.expr {
            ir::Expr::Constant(ir::Constant::Bool(true)) => self.goto(true_label),
            ir::Expr::Constant(ir::Constant::Bool(false)) => self.goto(false_label),
            ir::Expr::Unary(ir::UnaryOp::Not, inner) => {
                self.cond(inner, false_label, true_label)
            }
            ir::Expr::Logical(lhs, ir::LogicalOp::And, rhs) => {
                let k = self.cont_k;
                self.cont_k += 1;
                let cont = Label(format!("AND_CONT_{k}"));
                self.cond(lhs, &cont, false_label);
                self.label(&cont);
                self.cond(rhs, true_label, false_label);
            }
            ir::Expr::Logical(lhs, ir::LogicalOp::Or, rhs) => {
                let k = self.cont_k;
                self.cont_k += 1;
                let cont = Label(format!("OR_CONT_{k}"));
                self.cond(lhs, true_label, &cont);
                self.label(&cont);
                self.cond(rhs, true_label, false_label);
            }
            _ => {
                let value = self.expr_value(e);
                let cond = self.ensure_temp(value);
                self.push(Instr::IfGoto {
                    cond: Value::Place(cond),
                    target: true_label.clone(),
                });
                self.goto(false_label);
            }
        }
    }

    /// Storage location of an lvalue expression; assignment targets only.
    fn place(&mut self, e: &ir::ExprNode) -> Place {
        match &e.expr {
            ir::Expr::Var(symbol) | ir::Expr::This(symbol) => self.place_for(*symbol),
            ir::Expr::Field { object, offset, .. } => {
                let object = self.expr_value(object);
                let object = self.as_place(object);
                Place::Index(Box::new(object), Box::new(Value::Int(*offset as i64)))
            }
            ir::Expr::Index(base, index) => {
                let base = self.expr_value(base);
                let base = self.as_place(base);
                let index = self.expr_value(index);
                Place::Index(Box::new(base), Box::new(index))
            }
            _ => unreachable!("ICE: assignment to a non-lvalue survived analysis"),
        }
    }
}

fn constant_value(c: &ir::Constant) -> Value {
    match c {
        ir::Constant::Integer(v) => Value::Int(*v),
        ir::Constant::Str(s) => Value::Str(s.clone()),
        ir::Constant::Bool(b) => Value::Int(*b as i64),
        ir::Constant::Null => Value::Int(0),
    }
}

fn binop(op: ir::BinaryOp) -> BinOp {
    match op {
        ir::BinaryOp::Add => BinOp::Add,
        ir::BinaryOp::Sub => BinOp::Sub,
        ir::BinaryOp::Mul => BinOp::Mul,
        ir::BinaryOp::Div => BinOp::Div,
        ir::BinaryOp::Rem => BinOp::Rem,
        ir::BinaryOp::Eq => BinOp::Eq,
        ir::BinaryOp::Ne => BinOp::Ne,
        ir::BinaryOp::Lt => BinOp::Lt,
        ir::BinaryOp::Le => BinOp::Le,
        ir::BinaryOp::Gt => BinOp::Gt,
        ir::BinaryOp::Ge => BinOp::Ge,
    }
}
