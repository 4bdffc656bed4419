//! Owning/inverse resolution for relation requests
//!
//! | Cardinality | Owning side | Other side |
//! |---|---|---|
//! | ManyToOne  | source | collection on target, when generated |
//! | OneToMany  | target | collection on source, when generated |
//! | ManyToMany | source | mirrored collection on target, when generated |
//! | OneToOne   | source, unless flipped | single reference on target |
//!
//! A target outside the editable root never receives a property and never
//! gets an inverse field.

use scaffold_source::inflector::is_identifier;

use crate::cardinality::Cardinality;
use crate::error::RelationError;
use crate::plan::{MutationPlan, RelationProperty};
use crate::request::RelationRequest;

/// Plans relation properties for both sides of a request
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationPlanner;

impl RelationPlanner {
    /// Create planner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether the request will add a property to the target class
    ///
    /// Callers use this to decide whether to ask for an inverse field name
    /// at all.
    #[must_use]
    pub fn plans_inverse(&self, request: &RelationRequest) -> bool {
        request.target.editable
            && (request.cardinality == Cardinality::OneToMany || request.generate_inverse)
    }

    /// Validate a request without planning it
    ///
    /// # Errors
    /// Returns [`RelationError::InvalidRequest`] describing the first problem.
    pub fn validate(&self, request: &RelationRequest) -> Result<(), RelationError> {
        let cardinality = request.cardinality;
        if !request.source.editable {
            return Err(RelationError::invalid(format!(
                "class '{}' is outside the editable source root",
                request.source.fqn
            )));
        }
        if !is_identifier(&request.field) {
            return Err(RelationError::invalid(format!(
                "'{}' is not a valid field name",
                request.field
            )));
        }
        if request.flip_owning && cardinality != Cardinality::OneToOne {
            return Err(RelationError::invalid(
                "only one-to-one relations can make the target the owning side",
            ));
        }
        if request.flip_owning && !request.generate_inverse {
            return Err(RelationError::invalid(
                "a flipped one-to-one needs the inverse side to be generated",
            ));
        }
        if !request.target.editable
            && (cardinality == Cardinality::OneToMany || request.flip_owning)
        {
            return Err(RelationError::invalid(format!(
                "'{}' is not editable and cannot hold the owning side of the relation",
                request.target.fqn
            )));
        }
        if cardinality == Cardinality::ManyToMany && request.nullable {
            return Err(RelationError::invalid(
                "many-to-many relations cannot be nullable",
            ));
        }

        let inverse = self.plans_inverse(request);
        if inverse {
            let inverse_field = request.resolved_inverse_field();
            if !is_identifier(&inverse_field) {
                return Err(RelationError::invalid(format!(
                    "'{inverse_field}' is not a valid field name"
                )));
            }
            if request.is_self_referencing() && inverse_field == request.field {
                return Err(RelationError::invalid(format!(
                    "a self-referencing relation needs two distinct field names, got '{inverse_field}' twice"
                )));
            }
        }

        if request.orphan_removal {
            match cardinality {
                Cardinality::ManyToMany => {
                    return Err(RelationError::invalid(
                        "orphan removal is not supported on many-to-many relations",
                    ));
                }
                Cardinality::ManyToOne | Cardinality::OneToMany => {
                    if request.nullable {
                        return Err(RelationError::invalid(
                            "orphan removal needs a non-nullable many-to-one side",
                        ));
                    }
                    let collection_planned = match cardinality {
                        Cardinality::ManyToOne => inverse,
                        _ => request.generate_inverse,
                    };
                    if !collection_planned {
                        return Err(RelationError::invalid(
                            "orphan removal needs the collection side to be generated",
                        ));
                    }
                }
                Cardinality::OneToOne => {}
            }
        }
        Ok(())
    }

    /// Plan the properties of both sides
    ///
    /// # Errors
    /// Returns [`RelationError::InvalidRequest`] before anything is planned
    /// when the request is inconsistent.
    pub fn plan(&self, request: &RelationRequest) -> Result<MutationPlan, RelationError> {
        self.validate(request)?;
        let inverse = self.plans_inverse(request);
        let inverse_field = inverse.then(|| request.resolved_inverse_field());
        let source = &request.source;
        let target = &request.target;
        let mut plan = MutationPlan::new();

        match request.cardinality {
            Cardinality::ManyToOne => {
                plan.push(
                    source,
                    RelationProperty {
                        field: request.field.clone(),
                        cardinality: Cardinality::ManyToOne,
                        target: target.clone(),
                        owning: true,
                        counterpart: inverse_field.clone(),
                        nullable: request.nullable,
                        orphan_removal: false,
                        unique: false,
                        counterpart_nullable: false,
                    },
                );
                if let Some(field) = inverse_field {
                    plan.push(
                        target,
                        RelationProperty {
                            field,
                            cardinality: Cardinality::OneToMany,
                            target: source.clone(),
                            owning: false,
                            counterpart: Some(request.field.clone()),
                            nullable: false,
                            orphan_removal: request.orphan_removal,
                            unique: false,
                            counterpart_nullable: request.nullable,
                        },
                    );
                }
            }
            Cardinality::OneToMany => {
                let owning_field = request.resolved_inverse_field();
                if request.generate_inverse {
                    plan.push(
                        source,
                        RelationProperty {
                            field: request.field.clone(),
                            cardinality: Cardinality::OneToMany,
                            target: target.clone(),
                            owning: false,
                            counterpart: Some(owning_field.clone()),
                            nullable: false,
                            orphan_removal: request.orphan_removal,
                            unique: false,
                            counterpart_nullable: request.nullable,
                        },
                    );
                }
                plan.push(
                    target,
                    RelationProperty {
                        field: owning_field,
                        cardinality: Cardinality::ManyToOne,
                        target: source.clone(),
                        owning: true,
                        counterpart: request.generate_inverse.then(|| request.field.clone()),
                        nullable: request.nullable,
                        orphan_removal: false,
                        unique: false,
                        counterpart_nullable: false,
                    },
                );
            }
            Cardinality::ManyToMany => {
                plan.push(
                    source,
                    RelationProperty {
                        field: request.field.clone(),
                        cardinality: Cardinality::ManyToMany,
                        target: target.clone(),
                        owning: true,
                        counterpart: inverse_field.clone(),
                        nullable: false,
                        orphan_removal: false,
                        unique: false,
                        counterpart_nullable: false,
                    },
                );
                if let Some(field) = inverse_field {
                    plan.push(
                        target,
                        RelationProperty {
                            field,
                            cardinality: Cardinality::ManyToMany,
                            target: source.clone(),
                            owning: false,
                            counterpart: Some(request.field.clone()),
                            nullable: false,
                            orphan_removal: false,
                            unique: false,
                            counterpart_nullable: false,
                        },
                    );
                }
            }
            Cardinality::OneToOne => {
                let source_owns = !request.flip_owning;
                plan.push(
                    source,
                    RelationProperty {
                        field: request.field.clone(),
                        cardinality: Cardinality::OneToOne,
                        target: target.clone(),
                        owning: source_owns,
                        counterpart: inverse_field.clone(),
                        nullable: if source_owns { request.nullable } else { true },
                        orphan_removal: request.orphan_removal,
                        unique: source_owns,
                        counterpart_nullable: if source_owns { true } else { request.nullable },
                    },
                );
                if let Some(field) = inverse_field {
                    plan.push(
                        target,
                        RelationProperty {
                            field,
                            cardinality: Cardinality::OneToOne,
                            target: source.clone(),
                            owning: !source_owns,
                            counterpart: Some(request.field.clone()),
                            nullable: if source_owns { true } else { request.nullable },
                            orphan_removal: false,
                            unique: !source_owns,
                            counterpart_nullable: if source_owns { request.nullable } else { true },
                        },
                    );
                }
            }
        }

        tracing::debug!(
            source = %source.fqn,
            target = %target.fqn,
            cardinality = %request.cardinality,
            files = plan.files().len(),
            "planned relation"
        );
        Ok(plan)
    }
}
