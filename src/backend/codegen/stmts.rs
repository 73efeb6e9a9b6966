//! Statement emission.

use crate::frontend::ast::{NodeId, NodeKind, Storage};
use crate::frontend::stack::ensure_sufficient_stack;
use crate::optimizer::effects;

use super::exprs::bare;
use super::{Breakable, CodeGenerator, Frame, Result};

impl CodeGenerator<'_> {
    pub(super) fn stmts(&mut self, ids: &[NodeId]) -> Result<()> {
        for &id in ids {
            self.stmt(id)?;
        }
        Ok(())
    }

    pub(super) fn stmt(&mut self, id: NodeId) -> Result<()> {
        ensure_sufficient_stack(|| self.stmt_inner(id))
    }

    fn stmt_inner(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::VarDecl(var) if var.storage == Storage::Global => self.global_init(id),
            NodeKind::VarDecl(_) => self.local(id),
            // Emitted at file scope.
            NodeKind::Func(_) | NodeKind::StructDecl { .. } | NodeKind::EnumDecl { .. } => Ok(()),
            NodeKind::Block => {
                self.out.open("");
                self.stmts(ast.children(id))?;
                self.out.close("");
                Ok(())
            }
            NodeKind::If => self.if_stmt(id),
            NodeKind::While => {
                let c = ast.children(id);
                let cond = self.top_expr(c[0])?;
                self.out.open(&format!("while ({cond})"));
                self.loop_body(c[1], Breakable::Loop)?;
                self.out.close("");
                Ok(())
            }
            NodeKind::DoWhile => {
                let c = ast.children(id);
                self.out.open("do");
                self.loop_body(c[0], Breakable::Loop)?;
                let cond = self.top_expr(c[1])?;
                self.out.close(&format!(" while ({cond});"));
                Ok(())
            }
            NodeKind::For => self.for_stmt(id),
            NodeKind::Switch => self.switch_stmt(id),
            NodeKind::Break => self.jump(id, false),
            NodeKind::Continue => self.jump(id, true),
            NodeKind::Return => self.return_stmt(id),
            NodeKind::Throw => {
                let message = match ast.child(id, 0) {
                    Some(value) => self.arg_expr(value)?,
                    None => "NULL".to_string(),
                };
                self.out.line(&format!("dr_throw({message});"));
                Ok(())
            }
            NodeKind::Try => self.try_stmt(id),
            NodeKind::ExprStmt => {
                if let Some(expr) = ast.child(id, 0) {
                    let code = self.top_expr(expr)?;
                    self.out.line(&format!("{code};"));
                }
                Ok(())
            }
            NodeKind::Empty => Ok(()),
            other => Err(self.unsupported(id, format!("statement `{}`", other.label()))),
        }
    }

    /// Contents of a control-flow body; the caller has opened the braces.
    fn body(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        if matches!(ast.kind(id), NodeKind::Block) {
            self.stmts(ast.children(id))
        } else {
            self.stmt(id)
        }
    }

    fn loop_body(&mut self, id: NodeId, kind: Breakable) -> Result<()> {
        self.func.breakables.push(kind);
        let result = self.body(id);
        self.func.breakables.pop();
        result
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn local(&mut self, id: NodeId) -> Result<()> {
        if let Some(decl) = self.local_declaration(id)? {
            self.out.line(&format!("{decl};"));
            return Ok(());
        }
        // Initializer list with effects: zero the array, then assign the elements in order.
        let ast = self.ast;
        let ty = self.ty(id)?;
        let name = self.var_name(id)?;
        let decl = self.declare(ty, &name, false, id)?;
        self.out.line(&format!("{decl} = {{0}};"));
        if let Some(init) = ast.child(id, 0) {
            for (i, &element) in ast.children(init).iter().enumerate() {
                let value = self.arg_expr(element)?;
                self.out.line(&format!("{name}[{i}] = {value};"));
            }
        }
        Ok(())
    }

    /// A local declaration as one C declaration, or `None` for an initializer list whose elements have effects.
    fn local_declaration(&mut self, id: NodeId) -> Result<Option<String>> {
        let ast = self.ast;
        let ty = self.ty(id)?;
        let name = self.var_name(id)?;
        let decl = self.declare(ty, &name, self.func.volatile, id)?;
        let Some(init) = ast.child(id, 0) else {
            let zero = self.zero_value(ty).unwrap_or("{0}");
            return Ok(Some(format!("{decl} = {zero}")));
        };
        if matches!(ast.kind(init), NodeKind::ArrayInit) {
            let elements = ast.children(init);
            if elements.iter().any(|&e| !effects::is_pure(ast, self.types, e)) {
                return Ok(None);
            }
            let list = self.init_list(elements)?;
            return Ok(Some(format!("{decl} = {list}")));
        }
        let value = self.arg_expr(init)?;
        Ok(Some(format!("{decl} = {value}")))
    }

    /// Run-time part of a global's initialization, at the position of its declaration.
    fn global_init(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        let Some(init) = ast.child(id, 0) else { return Ok(()) };
        if self.is_constant_init(init) {
            return Ok(());
        }
        let name = self.var_name(id)?;
        if matches!(ast.kind(init), NodeKind::ArrayInit) {
            for (i, &element) in ast.children(init).iter().enumerate() {
                let value = self.arg_expr(element)?;
                self.out.line(&format!("{name}[{i}] = {value};"));
            }
            return Ok(());
        }
        let value = self.arg_expr(init)?;
        self.out.line(&format!("{name} = {value};"));
        Ok(())
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    fn if_stmt(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        let c = ast.children(id);
        let cond = self.top_expr(c[0])?;
        self.out.open(&format!("if ({cond})"));
        self.body(c[1])?;
        let mut otherwise = c.get(2).copied();
        while let Some(branch) = otherwise {
            if matches!(ast.kind(branch), NodeKind::If) {
                let bc = ast.children(branch);
                let cond = self.top_expr(bc[0])?;
                self.out.reopen(&format!("else if ({cond})"));
                self.body(bc[1])?;
                otherwise = bc.get(2).copied();
            } else {
                self.out.reopen("else");
                self.body(branch)?;
                otherwise = None;
            }
        }
        self.out.close("");
        Ok(())
    }

    fn for_stmt(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        let [init, cond, step, body] = ast.children(id)[..] else {
            return Err(self.unsupported(id, "a malformed for loop"));
        };
        let init_code = match ast.kind(init) {
            NodeKind::Empty => Some(String::new()),
            NodeKind::VarDecl(_) => self.local_declaration(init)?,
            _ => Some(self.top_expr(init)?),
        };
        // An initializer that needs several statements runs in an enclosing block.
        let lowered = init_code.is_none();
        if lowered {
            self.out.open("");
            self.stmt(init)?;
        }
        let cond_code = match ast.kind(cond) {
            NodeKind::Empty => String::new(),
            _ => self.top_expr(cond)?,
        };
        let step_code = match ast.kind(step) {
            NodeKind::Empty => String::new(),
            _ => self.top_expr(step)?,
        };
        let mut header = format!("for ({};", init_code.unwrap_or_default());
        for (i, part) in [cond_code, step_code].into_iter().enumerate() {
            if !part.is_empty() {
                header.push(' ');
                header.push_str(&part);
            }
            header.push(if i == 0 { ';' } else { ')' });
        }
        self.out.open(&header);
        self.loop_body(body, Breakable::Loop)?;
        self.out.close("");
        if lowered {
            self.out.close("");
        }
        Ok(())
    }

    fn switch_stmt(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        let Some((&subject, cases)) = ast.children(id).split_first() else {
            return Err(self.unsupported(id, "a switch without a subject"));
        };
        let subject = self.top_expr(subject)?;
        self.out.open(&format!("switch ({subject})"));
        self.func.breakables.push(Breakable::Switch);
        let result = self.cases(cases);
        self.func.breakables.pop();
        result?;
        self.out.close("");
        Ok(())
    }

    /// Each case body gets its own braces; falling off the end still falls through to the next label.
    fn cases(&mut self, cases: &[NodeId]) -> Result<()> {
        let ast = self.ast;
        for &case in cases {
            let NodeKind::Case { is_default } = *ast.kind(case) else {
                return Err(self.unsupported(case, "a switch arm"));
            };
            let children = ast.children(case);
            let stmts = if is_default {
                self.out.open("default:");
                children
            } else {
                let (&value, rest) = children
                    .split_first()
                    .ok_or_else(|| self.unsupported(case, "a case without a value"))?;
                let label = bare(self.expr(value)?);
                self.out.open(&format!("case {label}:"));
                rest
            };
            self.stmts(stmts)?;
            self.out.close("");
        }
        Ok(())
    }

    /// `break` or `continue`, popping the `try` frames entered since the target loop or switch.
    fn jump(&mut self, id: NodeId, is_continue: bool) -> Result<()> {
        let breakables = &self.func.breakables;
        let target = if is_continue {
            breakables.iter().rposition(|&b| b == Breakable::Loop)
        } else {
            breakables.len().checked_sub(1)
        };
        let target = target.ok_or_else(|| self.unsupported(id, "a jump outside any loop"))?;
        let leaving: Vec<String> = self
            .func
            .frames
            .iter()
            .rev()
            .filter(|f| f.depth > target)
            .map(|f| format!("dr_try_leave(&{});", f.name))
            .collect();
        for line in leaving {
            self.out.line(&line);
        }
        self.out.line(if is_continue { "continue;" } else { "break;" });
        Ok(())
    }

    fn return_stmt(&mut self, id: NodeId) -> Result<()> {
        let value = self.ast.child(id, 0);
        if self.func.frames.is_empty() {
            match value {
                Some(v) => {
                    let code = self.top_expr(v)?;
                    self.out.line(&format!("return {code};"));
                }
                None => self.out.line("return;"),
            }
            return Ok(());
        }

        // Evaluate the value while the frames still protect it, then pop them all.
        let leaving: Vec<String> = self
            .func
            .frames
            .iter()
            .rev()
            .map(|f| format!("dr_try_leave(&{});", f.name))
            .collect();
        let Some(v) = value else {
            for line in leaving {
                self.out.line(&line);
            }
            self.out.line("return;");
            return Ok(());
        };
        let ret = self.func.ret.ok_or_else(|| self.unsupported(id, "a return outside a function"))?;
        let decl = self.declare(ret, "dr_ret", false, id)?;
        let code = self.arg_expr(v)?;
        self.out.open("");
        self.out.line(&format!("{decl} = {code};"));
        for line in leaving {
            self.out.line(&line);
        }
        self.out.line("return dr_ret;");
        self.out.close("");
        Ok(())
    }

    fn try_stmt(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        let (body, handler) = (ast.children(id)[0], ast.children(id)[1]);
        let name = format!("dr_f{}", self.func.next_frame);
        self.func.next_frame += 1;

        self.out.open("");
        self.out.line(&format!("dr_frame {name};"));
        self.out.line(&format!("dr_try_enter(&{name});"));
        self.out.open(&format!("if (setjmp({name}.env) == 0)"));
        self.func.frames.push(Frame {
            name: name.clone(),
            depth: self.func.breakables.len(),
        });
        let result = self.body(body);
        self.func.frames.pop();
        result?;
        self.out.line(&format!("dr_try_leave(&{name});"));
        // `dr_throw` has already popped the frame when control arrives here.
        self.out.reopen("else");
        self.body(handler)?;
        self.out.close("");
        self.out.close("");
        Ok(())
    }
}
