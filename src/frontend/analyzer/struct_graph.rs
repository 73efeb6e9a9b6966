//! By-value containment graph between structs.
//!
//! A struct that contains itself (directly, through other structs, or through arrays of structs) has no finite
//! size. The check is a three-color depth-first search; a gray-to-gray edge closes a cycle. Post-order gives the
//! emission order for the generated struct definitions.

use std::collections::HashMap;

use dream_core::types::{Type, TypeId};

use crate::frontend::ast::NodeId;
use crate::frontend::errors;

use super::Analyzer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl Analyzer<'_> {
    /// Struct types stored by value inside `ty`'s fields, in field order.
    fn contained_structs(&self, ty: TypeId) -> Vec<TypeId> {
        let Some(s) = self.types.as_struct(ty) else {
            return Vec::new();
        };
        s.fields
            .iter()
            .filter_map(|f| {
                let mut field_ty = f.ty;
                while let Some(array) = self.types.as_array(field_ty) {
                    field_ty = array.elem;
                }
                matches!(self.types.get(field_ty), Type::Struct(_)).then_some(field_ty)
            })
            .collect()
    }

    pub(super) fn check_struct_graph(&mut self) {
        let decls: HashMap<TypeId, NodeId> = self.struct_decls.iter().copied().collect();
        let mut color: HashMap<TypeId, Color> = decls.keys().map(|&t| (t, Color::White)).collect();
        let mut order = Vec::with_capacity(decls.len());

        let roots: Vec<TypeId> = self.struct_decls.iter().map(|&(t, _)| t).collect();
        for root in roots {
            if color.get(&root) != Some(&Color::White) {
                continue;
            }
            // Explicit stack of (struct, remaining successors) so deep chains cannot overflow.
            let mut stack: Vec<(TypeId, std::vec::IntoIter<TypeId>)> = Vec::new();
            color.insert(root, Color::Gray);
            stack.push((root, self.contained_structs(root).into_iter()));

            while let Some((current, successors)) = stack.last_mut() {
                let current = *current;
                match successors.next() {
                    Some(next) => match color.get(&next).copied().unwrap_or(Color::Black) {
                        Color::White => {
                            color.insert(next, Color::Gray);
                            let successors = self.contained_structs(next).into_iter();
                            stack.push((next, successors));
                        }
                        Color::Gray => {
                            let start = stack.iter().position(|(t, _)| *t == next).unwrap_or(0);
                            let mut path: Vec<String> = stack[start..].iter().map(|(t, _)| self.render(*t)).collect();
                            path.push(self.render(next));
                            let at = decls.get(&current).copied().map(|id| self.at(id));
                            if let Some(at) = at {
                                let diagnostic = errors::circular_struct(&path, at);
                                self.report(diagnostic);
                            }
                        }
                        Color::Black => {}
                    },
                    None => {
                        color.insert(current, Color::Black);
                        order.push(current);
                        stack.pop();
                    }
                }
            }
        }
        self.struct_order = order;
    }
}
