use std::collections::{BTreeMap, HashMap, HashSet};

use super::{
    error,
    types::{Cardinality, Definition, NamespacedName, Namespaces, Type, TypeKind},
};

/// Lookup structure over every named type in a parsed definition.
///
/// The parser records types in document order; resolution of base links,
/// derived-type fan-out and emission ordering all happen here.
pub struct TypeGraph<'a> {
    types: HashMap<&'a NamespacedName, &'a Type>,
    order: Vec<&'a NamespacedName>,
}

impl<'a> TypeGraph<'a> {
    pub fn build(
        definition: &'a Definition,
        namespaces: &Namespaces,
    ) -> Result<Self, error::Error> {
        let mut types = HashMap::new();
        let mut order = Vec::new();

        for ty in &definition.types {
            if types.insert(&ty.name, ty).is_some() {
                return Err(error::Error::DuplicateType(format!(
                    "{{{}}}{}",
                    ty.name.namespace(namespaces),
                    ty.name.name
                )));
            }
            order.push(&ty.name);
        }

        Ok(Self { types, order })
    }

    pub fn get(&self, name: &NamespacedName) -> Option<&'a Type> {
        self.types.get(name).copied()
    }

    pub fn contains(&self, name: &NamespacedName) -> bool {
        self.types.contains_key(name)
    }

    /// Every type that names `base` as its extension parent, directly or
    /// transitively, in declaration order.
    pub fn derived_types(&self, base: &NamespacedName) -> Vec<&'a Type> {
        let mut derived = Vec::new();

        for name in &self.order {
            let ty = self.types[*name];
            if self.extends(ty, base) {
                derived.push(ty);
            }
        }

        derived
    }

    fn extends(&self, ty: &Type, ancestor: &NamespacedName) -> bool {
        let mut current = match &ty.kind {
            TypeKind::Struct(st) => st.base.as_ref(),
            _ => None,
        };

        while let Some(base) = current {
            if base == ancestor {
                return true;
            }
            current = match self.get(base).map(|ty| &ty.kind) {
                Some(TypeKind::Struct(st)) => st.base.as_ref(),
                _ => None,
            };
        }

        false
    }

    /// The full extension chain for a struct type, outermost ancestor first.
    /// The type itself is the last entry.
    pub fn ancestry(&self, ty: &'a Type) -> Result<Vec<&'a Type>, error::Error> {
        let mut chain = vec![ty];
        let mut current = ty;

        loop {
            let base = match &current.kind {
                TypeKind::Struct(st) => st.base.as_ref(),
                _ => None,
            };

            match base {
                Some(base) => {
                    let parent =
                        self.get(base)
                            .ok_or_else(|| error::Error::UnresolvedReference {
                                kind: "base type",
                                name: base.name.clone(),
                            })?;
                    if chain.iter().any(|link| link.name == parent.name) {
                        return Err(error::Error::RecursiveType(ty.name.name.clone()));
                    }
                    chain.push(parent);
                    current = parent;
                }
                None => break,
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Types ordered so that every base and every by-value field type
    /// precedes its users. Optional and repeated fields are indirected in
    /// the generated code, so only required non-nillable fields form edges;
    /// a cycle through those has no finite value and is rejected.
    pub fn topological_order(&self) -> Result<Vec<&'a Type>, error::Error> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            graph: &TypeGraph<'a>,
            name: &'a NamespacedName,
            marks: &mut HashMap<&'a NamespacedName, Mark>,
            out: &mut Vec<&'a Type>,
        ) -> Result<(), error::Error> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(error::Error::RecursiveType(name.name.clone()))
                }
                None => (),
            }

            let ty = graph.types[name];
            marks.insert(name, Mark::Visiting);

            if let TypeKind::Struct(st) = &ty.kind {
                if let Some(base) = &st.base {
                    if let Some((key, _)) = graph.types.get_key_value(base) {
                        visit(graph, key, marks, out)?;
                    }
                }

                for field in &st.fields {
                    let by_value =
                        field.cardinality == Cardinality::Required && !field.nillable;
                    if by_value {
                        if let Some((key, _)) = graph.types.get_key_value(&field.ty) {
                            visit(graph, key, marks, out)?;
                        }
                    }
                }
            }

            marks.insert(name, Mark::Done);
            out.push(ty);
            Ok(())
        }

        let mut marks = HashMap::new();
        let mut out = Vec::new();

        for name in &self.order {
            visit(self, name, &mut marks, &mut out)?;
        }

        Ok(out)
    }

    /// Local names defined in more than one namespace. The caller decides
    /// whether its prefix configuration disambiguates them.
    pub fn local_name_collisions(&self) -> BTreeMap<&'a str, Vec<usize>> {
        let mut seen: BTreeMap<&str, HashSet<usize>> = BTreeMap::new();

        for name in &self.order {
            seen.entry(&name.name).or_default().insert(name.index());
        }

        seen.into_iter()
            .filter(|(_, namespaces)| namespaces.len() > 1)
            .map(|(name, namespaces)| {
                let mut namespaces: Vec<_> = namespaces.into_iter().collect();
                namespaces.sort_unstable();
                (name, namespaces)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, StructType};

    fn name(namespaces: &mut Namespaces, local: &str) -> NamespacedName {
        NamespacedName::new(namespaces, "urn:test", local.to_owned())
    }

    fn struct_type(
        name: NamespacedName,
        base: Option<NamespacedName>,
        is_abstract: bool,
        fields: Vec<Field>,
    ) -> Type {
        Type {
            name,
            kind: TypeKind::Struct(StructType {
                base,
                is_abstract,
                fields,
            }),
        }
    }

    fn field(name: NamespacedName, ty: NamespacedName, cardinality: Cardinality) -> Field {
        Field {
            name,
            ty,
            cardinality,
            nillable: false,
        }
    }

    #[test]
    fn derived_types_are_transitive() {
        let mut namespaces = Namespaces::default();
        let base = name(&mut namespaces, "Scheme");
        let middle = name(&mut namespaces, "CpcScheme");
        let leaf = name(&mut namespaces, "EnhancedCpcScheme");
        let unrelated = name(&mut namespaces, "Budget");

        let definition = Definition {
            types: vec![
                struct_type(base.clone(), None, true, vec![]),
                struct_type(middle.clone(), Some(base.clone()), false, vec![]),
                struct_type(leaf.clone(), Some(middle.clone()), false, vec![]),
                struct_type(unrelated, None, false, vec![]),
            ],
            ..Default::default()
        };

        let graph = TypeGraph::build(&definition, &namespaces).unwrap();
        let derived: Vec<_> = graph
            .derived_types(&base)
            .into_iter()
            .map(|ty| ty.name.name.as_str())
            .collect();

        assert_eq!(derived, vec!["CpcScheme", "EnhancedCpcScheme"]);
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let mut namespaces = Namespaces::default();
        let duplicated = name(&mut namespaces, "Campaign");

        let definition = Definition {
            types: vec![
                struct_type(duplicated.clone(), None, false, vec![]),
                struct_type(duplicated, None, false, vec![]),
            ],
            ..Default::default()
        };

        assert!(matches!(
            TypeGraph::build(&definition, &namespaces),
            Err(error::Error::DuplicateType(_))
        ));
    }

    #[test]
    fn required_cycle_is_rejected_but_optional_cycle_is_fine() {
        let mut namespaces = Namespaces::default();
        let a = name(&mut namespaces, "Node");
        let b = name(&mut namespaces, "Edge");
        let field_name = name(&mut namespaces, "link");

        let cyclic = Definition {
            types: vec![
                struct_type(
                    a.clone(),
                    None,
                    false,
                    vec![field(field_name.clone(), b.clone(), Cardinality::Required)],
                ),
                struct_type(
                    b.clone(),
                    None,
                    false,
                    vec![field(field_name.clone(), a.clone(), Cardinality::Required)],
                ),
            ],
            ..Default::default()
        };

        let graph = TypeGraph::build(&cyclic, &namespaces).unwrap();
        assert!(matches!(
            graph.topological_order(),
            Err(error::Error::RecursiveType(_))
        ));

        let self_referential = Definition {
            types: vec![struct_type(
                a.clone(),
                None,
                false,
                vec![field(field_name, a.clone(), Cardinality::Optional)],
            )],
            ..Default::default()
        };

        let graph = TypeGraph::build(&self_referential, &namespaces).unwrap();
        let order = graph.topological_order().unwrap();
        assert_eq!(order.len(), 1);
    }

    #[test]
    fn topological_order_puts_field_types_first() {
        let mut namespaces = Namespaces::default();
        let inner = name(&mut namespaces, "Money");
        let outer = name(&mut namespaces, "Budget");
        let field_name = name(&mut namespaces, "amount");

        let definition = Definition {
            types: vec![
                struct_type(
                    outer.clone(),
                    None,
                    false,
                    vec![field(field_name, inner.clone(), Cardinality::Required)],
                ),
                struct_type(inner, None, false, vec![]),
            ],
            ..Default::default()
        };

        let graph = TypeGraph::build(&definition, &namespaces).unwrap();
        let order: Vec<_> = graph
            .topological_order()
            .unwrap()
            .into_iter()
            .map(|ty| ty.name.name.as_str())
            .collect();

        assert_eq!(order, vec!["Money", "Budget"]);
    }

    #[test]
    fn collisions_only_report_cross_namespace_names() {
        let mut namespaces = Namespaces::default();
        let first = NamespacedName::new(&mut namespaces, "urn:a", "Status".to_owned());
        let second = NamespacedName::new(&mut namespaces, "urn:b", "Status".to_owned());
        let lonely = NamespacedName::new(&mut namespaces, "urn:a", "Budget".to_owned());

        let definition = Definition {
            types: vec![
                struct_type(first, None, false, vec![]),
                struct_type(second, None, false, vec![]),
                struct_type(lonely, None, false, vec![]),
            ],
            ..Default::default()
        };

        let graph = TypeGraph::build(&definition, &namespaces).unwrap();
        let collisions = graph.local_name_collisions();

        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions["Status"].len(), 2);
    }
}
