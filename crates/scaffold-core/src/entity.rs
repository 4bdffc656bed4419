//! Interactive entity maker
//!
//! Asks for a class, then for fields until an empty name is given. Each
//! field is either a scalar column or a relation; relations are planned on
//! both classes and every edit is staged in one [`Session`], so a failed
//! answer leaves every file untouched.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use scaffold_relation::{
    describe_all, Cardinality, ClassRef, CodeEmitter, ColumnSpec, ColumnType, LoweredFile,
    RelationError, RelationPlanner, RelationRequest, TagRenderer,
};
use scaffold_source::inflector::{is_identifier, lcfirst, ucfirst};
use scaffold_source::display_name;
use serde::Serialize;

use crate::error::ScaffoldError;
use crate::fs::Filesystem;
use crate::layout::ProjectLayout;
use crate::prompt::{PromptKey, PromptRequest, Prompter};
use crate::session::{Session, WrittenFile};
use crate::template::TemplateRenderer;

static CLASS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\\?[A-Za-z_][A-Za-z0-9_]*(?:\\[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("class name pattern is valid")
});

const DEFAULT_LENGTH: &str = "255";

/// What a field type answer selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Column(ColumnType),
    Relation(Option<Cardinality>),
}

impl FieldKind {
    fn parse(text: &str) -> Result<Self, ScaffoldError> {
        if text.eq_ignore_ascii_case("relation") {
            return Ok(Self::Relation(None));
        }
        if let Ok(cardinality) = text.parse::<Cardinality>() {
            return Ok(Self::Relation(Some(cardinality)));
        }
        text.parse::<ColumnType>()
            .map(Self::Column)
            .map_err(|e| ScaffoldError::invalid(e.to_string()))
    }
}

/// Outcome of one entity maker run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    /// Fully-qualified name of the entity
    pub class: String,
    /// Files written, source first
    pub written: Vec<WrittenFile>,
    /// Fields left alone because they already existed
    pub skipped: Vec<String>,
    /// Informational lines shown during the run, then one line per file
    pub transcript: Vec<String>,
}

/// Creates or updates an entity from prompt answers
pub struct EntityMaker<'a> {
    fs: &'a dyn Filesystem,
    layout: &'a ProjectLayout,
    renderer: &'a dyn TagRenderer,
    templates: &'a dyn TemplateRenderer,
    overwrite: bool,
}

/// State of one run
struct Run<'s, 'a> {
    maker: &'s EntityMaker<'a>,
    session: Session<'a>,
    emitter: CodeEmitter<'a>,
    class: ClassRef,
    report: EntityReport,
}

fn ask_text(prompter: &mut dyn Prompter, request: &PromptRequest) -> Result<String, ScaffoldError> {
    let answer = prompter.ask(request)?;
    Ok(request.text(answer)?)
}

fn ask_bool(prompter: &mut dyn Prompter, request: &PromptRequest) -> Result<bool, ScaffoldError> {
    let answer = prompter.ask(request)?;
    Ok(request.boolean(answer)?)
}

fn validate_class_name(name: &str) -> Result<(), ScaffoldError> {
    if CLASS_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ScaffoldError::invalid(format!("'{name}' is not a valid class name")))
    }
}

fn validate_field_name(name: &str) -> Result<(), ScaffoldError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(ScaffoldError::invalid(format!("'{name}' is not a valid property name")))
    }
}

impl<'a> EntityMaker<'a> {
    /// Create maker
    #[must_use]
    pub fn new(
        fs: &'a dyn Filesystem,
        layout: &'a ProjectLayout,
        renderer: &'a dyn TagRenderer,
        templates: &'a dyn TemplateRenderer,
    ) -> Self {
        Self {
            fs,
            layout,
            renderer,
            templates,
            overwrite: false,
        }
    }

    /// Replace existing properties and methods instead of skipping them
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Run the question loop and commit the result
    ///
    /// # Errors
    /// Any error aborts the run before anything is written.
    pub fn run(&self, prompter: &mut dyn Prompter) -> Result<EntityReport, ScaffoldError> {
        let name = ask_text(
            prompter,
            &PromptRequest::new(
                PromptKey::ClassName,
                "Class name of the entity to create or update (e.g. BraveChef)",
            ),
        )?;
        validate_class_name(&name)?;
        let fqn = self.layout.entity_fqn(&name);
        let class = self.layout.class_ref(&fqn)?;
        if !class.editable {
            return Err(ScaffoldError::invalid(format!(
                "{} is outside the editable source root",
                class.path.display()
            )));
        }

        let mut session = Session::new(self.fs, self.templates).with_overwrite(self.overwrite);
        session.load_or_create(&class.path, &class.fqn)?;
        let mut run = Run {
            maker: self,
            emitter: CodeEmitter::new(self.renderer).with_overwrite(self.overwrite),
            report: EntityReport {
                class: class.fqn.clone(),
                ..EntityReport::default()
            },
            class,
            session,
        };
        if !run.session.is_new(&run.class.path) {
            run.report
                .transcript
                .push("Your entity already exists! So let's add some new fields!".to_string());
        }

        loop {
            let field = ask_text(
                prompter,
                &PromptRequest::new(
                    PromptKey::FieldName,
                    "New property name (press <return> to stop adding fields)",
                ),
            )?;
            if field.is_empty() {
                break;
            }
            validate_field_name(&field)?;
            let field_type = ask_text(
                prompter,
                &PromptRequest::new(PromptKey::FieldType, "Field type (enter relation to add a relation)")
                    .with_default("string"),
            )?;
            match FieldKind::parse(&field_type)? {
                FieldKind::Column(column_type) => run.add_column(prompter, &field, column_type)?,
                FieldKind::Relation(cardinality) => run.add_relation(prompter, &field, cardinality)?,
            }
        }

        let Run {
            session,
            mut report,
            ..
        } = run;
        report.written = session.commit()?;
        report
            .transcript
            .extend(report.written.iter().map(ToString::to_string));
        tracing::info!(class = %report.class, files = report.written.len(), "entity maker finished");
        Ok(report)
    }
}

impl<'s, 'a> Run<'s, 'a> {
    fn apply(&mut self, path: &Path, lowered: LoweredFile) -> Result<(), ScaffoldError> {
        let class = self
            .session
            .file(path)
            .map(|f| f.name().to_string())
            .unwrap_or_default();
        self.report
            .skipped
            .extend(lowered.skipped.iter().map(|field| format!("{class}::{field}")));
        if !lowered.is_empty() {
            self.session.apply(path, lowered.ops)?;
        }
        Ok(())
    }

    fn add_column(
        &mut self,
        prompter: &mut dyn Prompter,
        field: &str,
        column_type: ColumnType,
    ) -> Result<(), ScaffoldError> {
        let mut column = ColumnSpec::new(field, column_type);
        if column_type.has_length() {
            let length = ask_text(
                prompter,
                &PromptRequest::new(PromptKey::FieldLength, "Field length").with_default(DEFAULT_LENGTH),
            )?;
            let length = length
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ScaffoldError::invalid(format!("'{length}' is not a valid length")))?;
            column = column.with_length(length);
        }
        let nullable = ask_bool(
            prompter,
            &PromptRequest::yes_no(
                PromptKey::Nullable,
                "Can this field be null in the database (nullable)",
                false,
            ),
        )?;
        column = column.with_nullable(nullable);

        let path = self.class.path.clone();
        let file = self.session.load(&path)?;
        let lowered = self.emitter.lower_column(&column, file)?;
        self.apply(&path, lowered)
    }

    fn add_relation(
        &mut self,
        prompter: &mut dyn Prompter,
        field: &str,
        cardinality: Option<Cardinality>,
    ) -> Result<(), ScaffoldError> {
        let related = ask_text(
            prompter,
            &PromptRequest::new(PromptKey::RelatedClass, "What class should this entity be related to?"),
        )?;
        validate_class_name(&related)?;
        let target = self.maker.layout.class_ref(&self.maker.layout.entity_fqn(&related))?;
        let self_referencing = target.is_same_class(&self.class);
        if !self_referencing && !self.maker.fs.exists(&target.path) {
            return Err(ScaffoldError::invalid(format!(
                "class '{}' not found at {}",
                target.fqn,
                target.path.display()
            )));
        }
        let target = if self_referencing { self.class.clone() } else { target };

        let (source_name, target_name) = if self_referencing {
            let short = self.class.short_name().to_string();
            (short.clone(), short)
        } else {
            (
                display_name(&self.class.fqn, &target.fqn).map_err(RelationError::from)?,
                display_name(&target.fqn, &self.class.fqn).map_err(RelationError::from)?,
            )
        };

        let cardinality = match cardinality {
            Some(c) => c,
            None => {
                for description in describe_all(&self.class.fqn, &target.fqn).map_err(RelationError::from)? {
                    self.report.transcript.push(description.to_string());
                }
                let answer = ask_text(
                    prompter,
                    &PromptRequest::new(
                        PromptKey::RelationType,
                        "Relation type? [ManyToOne, OneToMany, ManyToMany, OneToOne]",
                    ),
                )?;
                answer
                    .parse::<Cardinality>()
                    .map_err(|e| ScaffoldError::invalid(e.to_string()))?
            }
        };

        let planner = RelationPlanner::new();
        let mut request = RelationRequest::new(self.class.clone(), target.clone(), cardinality, field);
        let nullable_question = |class: &str, property: &str| {
            PromptRequest::yes_no(
                PromptKey::Nullable,
                format!("Is the {class}.{property} property allowed to be null (nullable)?"),
                true,
            )
        };
        let inverse_question = |default: &str| {
            PromptRequest::yes_no(
                PromptKey::GenerateInverse,
                format!(
                    "Do you want to add a new property to {target_name} so that you can access/update {source_name} objects from it - e.g. ${}->get{}()?",
                    lcfirst(target.short_name()),
                    ucfirst(default),
                ),
                true,
            )
        };
        let inverse_name = |default: String| {
            PromptRequest::new(PromptKey::InverseField, format!("New field name inside {target_name}"))
                .with_default(default)
        };
        let orphan_question = PromptRequest::yes_no(
            PromptKey::OrphanRemoval,
            format!(
                "Do you want to automatically delete orphaned {} objects (orphanRemoval)?",
                orphaned_class(cardinality, &source_name, &target_name)
            ),
            false,
        );

        match cardinality {
            Cardinality::ManyToOne => {
                request.nullable = ask_bool(prompter, &nullable_question(&source_name, field))?;
                request.generate_inverse = planner.plans_inverse(&request)
                    && ask_bool(prompter, &inverse_question(&request.default_inverse_field()))?;
                if request.generate_inverse {
                    let name = ask_text(prompter, &inverse_name(request.default_inverse_field()))?;
                    request.inverse_field = Some(name);
                }
                if !request.nullable && request.generate_inverse {
                    request.orphan_removal = ask_bool(prompter, &orphan_question)?;
                }
            }
            Cardinality::OneToMany => {
                planner.validate(&request)?;
                self.report.transcript.push(format!(
                    "A new property will also be added to the {target_name} class so that you can access and set the related {source_name} object from it."
                ));
                let name = ask_text(prompter, &inverse_name(request.default_inverse_field()))?;
                request.nullable = ask_bool(prompter, &nullable_question(&target_name, &name))?;
                request.inverse_field = Some(name);
                if !request.nullable {
                    request.orphan_removal = ask_bool(prompter, &orphan_question)?;
                }
            }
            Cardinality::ManyToMany => {
                request.generate_inverse = planner.plans_inverse(&request)
                    && ask_bool(prompter, &inverse_question(&request.default_inverse_field()))?;
                if request.generate_inverse {
                    let name = ask_text(prompter, &inverse_name(request.default_inverse_field()))?;
                    request.inverse_field = Some(name);
                }
            }
            Cardinality::OneToOne => {
                request.nullable = ask_bool(prompter, &nullable_question(&source_name, field))?;
                request.generate_inverse = planner.plans_inverse(&request)
                    && ask_bool(prompter, &inverse_question(&request.default_inverse_field()))?;
                if request.generate_inverse {
                    let name = ask_text(prompter, &inverse_name(request.default_inverse_field()))?;
                    request.inverse_field = Some(name);
                }
            }
        }

        let plan = planner.plan(&request)?;
        for file_plan in plan.files() {
            let path = file_plan.class.path.clone();
            let file = self.session.load(&path)?;
            let lowered = self.emitter.lower_file(file_plan, file)?;
            self.apply(&path, lowered)?;
        }
        Ok(())
    }
}

/// Class whose objects become orphans: the many side of the relation
fn orphaned_class<'n>(cardinality: Cardinality, source: &'n str, target: &'n str) -> &'n str {
    match cardinality {
        Cardinality::OneToMany => target,
        _ => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names() {
        assert!(validate_class_name("User").is_ok());
        assert!(validate_class_name("Friend\\User").is_ok());
        assert!(validate_class_name("\\Some\\Vendor\\Group").is_ok());
        assert!(validate_class_name("Usé").is_err());
        assert!(validate_class_name("1User").is_err());
        assert!(validate_class_name("User\\").is_err());
    }

    #[test]
    fn field_kinds() {
        assert_eq!(FieldKind::parse("relation").unwrap(), FieldKind::Relation(None));
        assert_eq!(
            FieldKind::parse("ManyToOne").unwrap(),
            FieldKind::Relation(Some(Cardinality::ManyToOne))
        );
        assert_eq!(FieldKind::parse("string").unwrap(), FieldKind::Column(ColumnType::String));
        assert!(FieldKind::parse("money").is_err());
    }

    #[test]
    fn orphans_are_on_the_many_side() {
        assert_eq!(orphaned_class(Cardinality::ManyToOne, "Photo", "User"), "Photo");
        assert_eq!(orphaned_class(Cardinality::OneToMany, "User", "Photo"), "Photo");
    }
}
