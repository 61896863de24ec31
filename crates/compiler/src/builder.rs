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

//! AST Builder
//!
//! Parsers (and tests) construct trees through this builder so that every node receives a
//! unique [`NodeId`] at construction time. Positions are taken from the builder's cursor, which
//! the caller moves with [`AstBuilder::at`] as it walks its own tokens.

use crate::ast::{
    ArithOp, Comparator, CondArm, ElseArm, Expr, ExprNode, Keyword, LineCol, LoopCondition,
    MethodDecl, NodeId, Param, ParamNode, Program, Stmt, StmtNode,
};

#[derive(Debug)]
pub struct AstBuilder {
    next_id: u32,
    line_col: LineCol,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            line_col: (1, 1),
        }
    }

    /// Move the position cursor; subsequent nodes are stamped with it.
    pub fn at(&mut self, line: usize, col: usize) -> &mut Self {
        self.line_col = (line, col);
        self
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u32 {
        self.next_id
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn keyword(&self, text: &str) -> Keyword {
        Keyword {
            text: text.to_string(),
            line_col: self.line_col,
        }
    }

    fn expr(&mut self, node: ExprNode) -> Expr {
        Expr {
            id: self.next_id(),
            line_col: self.line_col,
            node,
        }
    }

    fn stmt(&mut self, node: StmtNode) -> Stmt {
        Stmt {
            id: self.next_id(),
            line_col: self.line_col,
            node,
        }
    }

    pub fn program(&self, methods: Vec<MethodDecl>, statements: Vec<Stmt>) -> Program {
        Program {
            methods,
            statements,
        }
    }

    pub fn method(
        &mut self,
        access: Option<&str>,
        return_type: &str,
        name: &str,
        params: Vec<Param>,
        body: Vec<Stmt>,
    ) -> MethodDecl {
        MethodDecl {
            id: self.next_id(),
            line_col: self.line_col,
            access: access.map(|a| self.keyword(a)),
            return_type: self.keyword(return_type),
            name: name.to_string(),
            params,
            body,
        }
    }

    pub fn param(&mut self, type_kw: &str, name: &str) -> Param {
        Param {
            id: self.next_id(),
            line_col: self.line_col,
            node: ParamNode::Declared {
                type_kw: self.keyword(type_kw),
                name: name.to_string(),
            },
        }
    }

    pub fn param_expr(&mut self, expr: Expr) -> Param {
        Param {
            id: self.next_id(),
            line_col: self.line_col,
            node: ParamNode::Expr(expr),
        }
    }

    // Expressions

    pub fn int(&mut self, value: i32) -> Expr {
        self.expr(ExprNode::Int(value))
    }

    pub fn double(&mut self, value: f64) -> Expr {
        self.expr(ExprNode::Double(value))
    }

    pub fn boolean(&mut self, value: bool) -> Expr {
        self.expr(ExprNode::Bool(value))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.expr(ExprNode::Str(value.to_string()))
    }

    pub fn var(&mut self, name: &str) -> Expr {
        self.expr(ExprNode::Var(name.to_string()))
    }

    pub fn binary(&mut self, op: ArithOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprNode::Binary(op, Box::new(left), Box::new(right)))
    }

    pub fn compare(&mut self, op: Comparator, left: Expr, right: Expr) -> Expr {
        self.expr(ExprNode::Compare(op, Box::new(left), Box::new(right)))
    }

    pub fn paren(&mut self, inner: Expr) -> Expr {
        self.expr(ExprNode::Paren(Box::new(inner)))
    }

    pub fn call(&mut self, name: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprNode::Call {
            name: name.to_string(),
            args,
        })
    }

    // Statements

    pub fn declare(&mut self, type_kw: &str, name: &str, init: Option<Expr>) -> Stmt {
        let type_kw = self.keyword(type_kw);
        self.stmt(StmtNode::Declare {
            type_kw,
            name: name.to_string(),
            init,
        })
    }

    pub fn assign(&mut self, name: &str, value: Expr) -> Stmt {
        self.stmt(StmtNode::Assign {
            name: name.to_string(),
            value,
        })
    }

    pub fn arm(&self, condition: Expr, statements: Vec<Stmt>) -> CondArm {
        CondArm {
            condition,
            statements,
        }
    }

    pub fn cond(&mut self, arms: Vec<CondArm>, otherwise: Option<Vec<Stmt>>) -> Stmt {
        self.stmt(StmtNode::Cond {
            arms,
            otherwise: otherwise.map(|statements| ElseArm { statements }),
        })
    }

    pub fn while_(&mut self, condition: Expr, body: Vec<Stmt>) -> Stmt {
        self.stmt(StmtNode::While { condition, body })
    }

    pub fn loop_condition(&mut self, op: Comparator, left: Expr, right: Expr) -> LoopCondition {
        LoopCondition {
            id: self.next_id(),
            line_col: self.line_col,
            op,
            left,
            right,
        }
    }

    pub fn for_(
        &mut self,
        init: Stmt,
        condition: LoopCondition,
        step: Stmt,
        body: Vec<Stmt>,
    ) -> Stmt {
        self.stmt(StmtNode::For {
            init: Box::new(init),
            condition,
            step: Box::new(step),
            body,
        })
    }

    pub fn print(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtNode::Print(expr))
    }

    pub fn ret(&mut self, expr: Option<Expr>) -> Stmt {
        self.stmt(StmtNode::Return(expr))
    }

    pub fn increment(&mut self, name: &str) -> Stmt {
        self.stmt(StmtNode::Increment(name.to_string()))
    }

    pub fn decrement(&mut self, name: &str) -> Stmt {
        self.stmt(StmtNode::Decrement(name.to_string()))
    }

    pub fn call_stmt(&mut self, name: &str, args: Vec<Expr>) -> Stmt {
        self.stmt(StmtNode::Call {
            name: name.to_string(),
            args,
        })
    }
}
