// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

/// Takes the checked AST and its annotations and turns them into assembly lines.
use tracing::{debug, warn};

use crate::annotations::Annotations;
use crate::ast::{
    ArithOp, Expr, ExprNode, LineCol, LoopCondition, MethodDecl, NodeId, Program, Stmt, StmtNode,
};
use crate::checker::{check, resolve_access};
use crate::errors::{CompileContext, CompileError};
use crate::labels::{Label, LabelAllocator};
use crate::opcode::{Cond, Directive, Family, Line, Op};
use crate::options::CompileOptions;
use crate::program::Assembly;
use crate::scope::Symbol;
use crate::types::DataType;

const PRINT_STREAM: &str = "java/io/PrintStream";

// Compiler code generation state.
pub struct CodegenState<'a> {
    pub(crate) lines: Vec<Line>,
    pub(crate) labels: LabelAllocator,
    annotations: &'a Annotations,
    options: &'a CompileOptions,
    /// One past the highest local slot touched in the method being generated.
    locals_used: u16,
    current_line_col: LineCol,
}

impl<'a> CodegenState<'a> {
    pub fn new(annotations: &'a Annotations, options: &'a CompileOptions) -> Self {
        Self {
            lines: vec![],
            labels: LabelAllocator::new(),
            annotations,
            options,
            locals_used: 0,
            current_line_col: (0, 0),
        }
    }

    fn emit(&mut self, op: Op) {
        self.lines.push(Line::Op(op));
    }

    fn directive(&mut self, directive: Directive) {
        self.lines.push(Line::Directive(directive));
    }

    fn commit_label(&mut self, label: Label) {
        self.lines.push(Line::Label(label));
    }

    fn context(&self) -> CompileContext {
        CompileContext::new(self.current_line_col)
    }

    fn type_of(&self, id: NodeId, line_col: LineCol) -> Result<DataType, CompileError> {
        self.annotations
            .type_of(id)
            .ok_or(CompileError::MissingAnnotation(CompileContext::new(line_col), id))
    }

    fn symbol_of(&self, id: NodeId, line_col: LineCol) -> Result<&'a Symbol, CompileError> {
        let annotations: &'a Annotations = self.annotations;
        annotations
            .symbol_of(id)
            .ok_or(CompileError::MissingAnnotation(CompileContext::new(line_col), id))
    }

    /// The type and slot of the variable bound to a node, noting the slot as used.
    fn variable_of(
        &mut self,
        id: NodeId,
        line_col: LineCol,
    ) -> Result<(DataType, u16), CompileError> {
        match self.symbol_of(id, line_col)? {
            Symbol::Variable {
                data_type, slot, ..
            } => {
                let (data_type, slot) = (*data_type, *slot);
                self.locals_used = self.locals_used.max(slot + data_type.slot_width());
                Ok((data_type, slot))
            }
            Symbol::Method { name, .. } => Err(CompileError::NotAVariable(
                CompileContext::new(line_col),
                name.clone(),
            )),
        }
    }

    fn family_of(&self, data_type: DataType) -> Result<Family, CompileError> {
        data_type
            .family()
            .ok_or(CompileError::VoidValue(self.context()))
    }

    fn begin_method(&mut self, access: &str, name: &str, descriptor: String) {
        self.directive(Directive::Method {
            access: access.to_string(),
            name: name.to_string(),
            descriptor,
        });
        self.directive(Directive::LimitStack(self.options.stack_limit));
        self.directive(Directive::LimitLocals(self.options.locals_limit));
        self.locals_used = 0;
    }

    fn end_method(&mut self, name: &str) {
        if self.locals_used > self.options.locals_limit {
            warn!(
                method = name,
                used = self.locals_used,
                limit = self.options.locals_limit,
                "method uses more local slots than the fixed limit"
            );
        }
        self.directive(Directive::EndMethod);
        self.lines.push(Line::Blank);
    }

    pub fn generate_program(&mut self, program: &Program) -> Result<(), CompileError> {
        self.directive(Directive::Class {
            access: "public".to_string(),
            name: self.options.class_name.clone(),
        });
        self.directive(Directive::Super("java/lang/Object".to_string()));
        self.lines.push(Line::Blank);

        for method in &program.methods {
            self.generate_method(method)?;
        }

        if self.options.entry_point {
            self.begin_method("public", "main", "([Ljava/lang/String;)V".to_string());
            for stmt in &program.statements {
                self.generate_stmt(stmt)?;
            }
            self.emit(Op::Return(None));
            self.end_method("main");
        }
        Ok(())
    }

    fn generate_method(&mut self, method: &MethodDecl) -> Result<(), CompileError> {
        self.current_line_col = method.line_col;
        let access = resolve_access(method)?;
        let return_type = self.type_of(method.id, method.line_col)?;
        let params = method
            .params
            .iter()
            .map(|p| self.type_of(p.id, p.line_col))
            .collect::<Result<Vec<_>, _>>()?;

        self.begin_method(
            access.directive(),
            &method.name,
            DataType::method_descriptor(&params, return_type),
        );
        for param in &method.params {
            if self.annotations.symbol_of(param.id).is_some() {
                self.variable_of(param.id, param.line_col)?;
            }
        }

        for stmt in &method.body {
            self.generate_stmt(stmt)?;
        }

        if return_type == DataType::Void {
            // Appended even when the body already returned.
            self.emit(Op::Return(None));
        } else if !method.body.last().is_some_and(|s| s.node.is_value_return()) {
            return Err(CompileError::MissingReturn(
                CompileContext::new(method.line_col),
                method.name.clone(),
            ));
        }
        self.end_method(&method.name);
        Ok(())
    }

    fn generate_block(&mut self, statements: &[Stmt]) -> Result<(), CompileError> {
        for stmt in statements {
            self.generate_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn generate_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        self.current_line_col = stmt.line_col;
        match &stmt.node {
            StmtNode::Declare { init, .. } => {
                let (data_type, slot) = self.variable_of(stmt.id, stmt.line_col)?;
                match init {
                    Some(init) => self.generate_expr(init)?,
                    None => self.emit(match data_type {
                        DataType::Double => Op::PushDouble(0.0),
                        DataType::String => Op::PushString(String::new()),
                        _ => Op::PushInt(0),
                    }),
                }
                self.current_line_col = stmt.line_col;
                let family = self.family_of(data_type)?;
                self.emit(Op::Store(family, slot));
            }
            StmtNode::Assign { value, .. } => {
                let (data_type, slot) = self.variable_of(stmt.id, stmt.line_col)?;
                self.generate_expr(value)?;
                self.current_line_col = stmt.line_col;
                let family = self.family_of(data_type)?;
                self.emit(Op::Store(family, slot));
            }
            StmtNode::Cond { arms, otherwise } => {
                let end_label = self.labels.next_label();
                for arm in arms {
                    let next_label = self.labels.next_label();
                    self.generate_expr(&arm.condition)?;
                    self.emit(Op::If(Cond::Eq, next_label));
                    self.generate_block(&arm.statements)?;
                    self.emit(Op::Goto(end_label));
                    self.commit_label(next_label);
                }
                if let Some(otherwise) = otherwise {
                    self.generate_block(&otherwise.statements)?;
                }
                self.commit_label(end_label);
            }
            StmtNode::While { condition, body } => {
                let test_label = self.labels.next_label();
                let done_label = self.labels.next_label();
                self.commit_label(test_label);
                self.generate_expr(condition)?;
                self.emit(Op::If(Cond::Eq, done_label));
                self.generate_block(body)?;
                self.emit(Op::Goto(test_label));
                self.commit_label(done_label);
            }
            StmtNode::For {
                init,
                condition,
                step,
                body,
            } => {
                let loop_label = self.labels.next_label();
                let done_label = self.labels.next_label();
                self.generate_stmt(init)?;
                self.commit_label(loop_label);
                self.generate_loop_test(condition, done_label)?;
                self.generate_block(body)?;
                self.generate_stmt(step)?;
                self.emit(Op::Goto(loop_label));
                self.commit_label(done_label);
            }
            StmtNode::Print(expr) => {
                self.emit(Op::GetStatic {
                    field: "java/lang/System/out".to_string(),
                    descriptor: format!("L{PRINT_STREAM};"),
                });
                self.generate_expr(expr)?;
                let data_type = self.type_of(stmt.id, stmt.line_col)?;
                if data_type == DataType::Void {
                    return Err(CompileError::VoidValue(CompileContext::new(stmt.line_col)));
                }
                self.emit(Op::InvokeVirtual {
                    method: format!("{PRINT_STREAM}/println"),
                    descriptor: DataType::method_descriptor(&[data_type], DataType::Void),
                });
            }
            StmtNode::Return(expr) => {
                if let Some(expr) = expr {
                    self.generate_expr(expr)?;
                }
                let data_type = self.type_of(stmt.id, stmt.line_col)?;
                self.emit(Op::Return(data_type.family()));
            }
            StmtNode::Increment(_) | StmtNode::Decrement(_) => {
                let (data_type, slot) = self.variable_of(stmt.id, stmt.line_col)?;
                if data_type != DataType::Int {
                    return Err(CompileError::UnsupportedOperand {
                        context: CompileContext::new(stmt.line_col),
                        operation: "iinc".to_string(),
                        data_type,
                    });
                }
                let delta = if matches!(stmt.node, StmtNode::Increment(_)) {
                    1
                } else {
                    -1
                };
                self.emit(Op::Iinc { slot, delta });
            }
            StmtNode::Call { name, args } => {
                self.generate_call(stmt.id, stmt.line_col, name, args)?;
                // Statements leave nothing behind.
                match self.type_of(stmt.id, stmt.line_col)? {
                    DataType::Void => {}
                    DataType::Double => self.emit(Op::Pop2),
                    _ => self.emit(Op::Pop),
                }
            }
        }

        Ok(())
    }

    /// Branch to `target` when the loop condition does not hold.
    fn generate_loop_test(
        &mut self,
        condition: &LoopCondition,
        target: Label,
    ) -> Result<(), CompileError> {
        let operand_type = self.type_of(condition.left.id, condition.left.line_col)?;
        self.generate_expr(&condition.left)?;
        self.generate_expr(&condition.right)?;
        self.current_line_col = condition.line_col;
        self.emit_compare_branch(Cond::from(condition.op).negate(), operand_type, target)
    }

    /// Consume two operands of `operand_type` and jump to `target` when `cond` holds between
    /// them. `cond` is always a negated comparator, so an unordered (NaN) double comparison
    /// must take the branch: `dcmpl` gives -1 for the `<`/`<=` tests, `dcmpg` gives 1 otherwise.
    fn emit_compare_branch(
        &mut self,
        cond: Cond,
        operand_type: DataType,
        target: Label,
    ) -> Result<(), CompileError> {
        match operand_type {
            DataType::Int | DataType::Boolean => self.emit(Op::IfCmp(cond, target)),
            DataType::Double => {
                self.emit(match cond {
                    Cond::Lt | Cond::Le => Op::Dcmpl,
                    _ => Op::Dcmpg,
                });
                self.emit(Op::If(cond, target));
            }
            DataType::String => {
                self.emit(Op::InvokeVirtual {
                    method: "java/lang/String/compareTo".to_string(),
                    descriptor: DataType::method_descriptor(&[DataType::String], DataType::Int),
                });
                self.emit(Op::If(cond, target));
            }
            DataType::Void => return Err(CompileError::VoidValue(self.context())),
        }
        Ok(())
    }

    fn generate_call(
        &mut self,
        id: NodeId,
        line_col: LineCol,
        name: &str,
        args: &[Expr],
    ) -> Result<(), CompileError> {
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            self.generate_expr(arg)?;
            arg_types.push(self.type_of(arg.id, arg.line_col)?);
        }
        let return_type = match self.symbol_of(id, line_col)? {
            Symbol::Method { return_type, .. } => *return_type,
            Symbol::Variable { .. } => {
                return Err(CompileError::NotAMethod(
                    CompileContext::new(line_col),
                    name.to_string(),
                ));
            }
        };
        self.emit(Op::InvokeStatic {
            method: format!("{}/{name}", self.options.class_name),
            descriptor: DataType::method_descriptor(&arg_types, return_type),
        });
        Ok(())
    }

    fn generate_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        self.current_line_col = expr.line_col;
        match &expr.node {
            ExprNode::Int(n) => self.emit(Op::PushInt(*n)),
            ExprNode::Double(d) => self.emit(Op::PushDouble(*d)),
            ExprNode::Bool(b) => self.emit(Op::PushInt(i32::from(*b))),
            ExprNode::Str(s) => self.emit(Op::PushString(s.clone())),
            ExprNode::Var(_) => {
                let (data_type, slot) = self.variable_of(expr.id, expr.line_col)?;
                let family = self.family_of(data_type)?;
                self.emit(Op::Load(family, slot));
            }
            ExprNode::Binary(op, left, right) => {
                self.generate_expr(left)?;
                self.generate_expr(right)?;
                self.current_line_col = expr.line_col;
                let data_type = self.type_of(expr.id, expr.line_col)?;
                let family = match data_type {
                    DataType::Int => Family::Int,
                    DataType::Double => Family::Double,
                    _ => {
                        return Err(CompileError::UnsupportedOperand {
                            context: self.context(),
                            operation: arith_name(*op).to_string(),
                            data_type,
                        });
                    }
                };
                self.emit(Op::Arith(family, *op));
            }
            ExprNode::Compare(op, left, right) => {
                let operand_type = self.type_of(left.id, left.line_col)?;
                self.generate_expr(left)?;
                self.generate_expr(right)?;
                self.current_line_col = expr.line_col;
                let false_label = self.labels.next_label();
                let done_label = self.labels.next_label();
                self.emit_compare_branch(Cond::from(*op).negate(), operand_type, false_label)?;
                self.emit(Op::PushInt(1));
                self.emit(Op::Goto(done_label));
                self.commit_label(false_label);
                self.emit(Op::PushInt(0));
                self.commit_label(done_label);
            }
            ExprNode::Paren(inner) => self.generate_expr(inner)?,
            ExprNode::Call { name, args } => {
                self.generate_call(expr.id, expr.line_col, name, args)?;
            }
        }

        Ok(())
    }
}

fn arith_name(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "addition",
        ArithOp::Sub => "subtraction",
        ArithOp::Mul => "multiplication",
        ArithOp::Mod => "remainder",
    }
}

/// Generate assembly for an already checked program.
pub fn generate(
    program: &Program,
    annotations: &Annotations,
    options: &CompileOptions,
) -> Result<Assembly, CompileError> {
    let mut cg_state = CodegenState::new(annotations, options);
    cg_state.generate_program(program)?;
    debug!(
        lines = cg_state.lines.len(),
        labels = cg_state.labels.issued(),
        "generated assembly"
    );
    Ok(Assembly {
        class_name: options.class_name.clone(),
        lines: cg_state.lines,
    })
}

/// Check and generate a program.
pub fn compile(program: &Program, options: CompileOptions) -> Result<Assembly, CompileError> {
    let annotations = check(program)?;
    generate(program, &annotations, &options)
}
