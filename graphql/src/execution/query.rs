use graphql_parser::Pos;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use bookshelf::prelude::{
    info, o, q, s, InputMode, Logger, Object, Query as GraphDataQuery, QueryExecutionError,
    QueryVariables, RequestContext, ENV_VARS,
};

use crate::query::ast::{self as qast, FragmentDefinition, OperationDefinition, SelectionSet};
use crate::schema::ast::{self as sast, ObjectType};
use crate::schema::{names, ApiSchema};
use crate::values::coercion::{coerce_argument_values, coerce_value};

/// Whether an operation reads or writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// A GraphQL operation that has been checked and is ready for execution.
///
/// Checking covers everything that can be known without touching the
/// store: the operation exists, variables have the declared types, every
/// selected field and argument is declared, arguments have the right
/// types, mutation input satisfies the entity's type descriptor, fragments
/// resolve, and the selection is not nested too deeply. A query that fails
/// any of these is never executed.
pub struct Query {
    /// The schema against which to execute the query
    pub schema: Arc<ApiSchema>,
    pub kind: OperationKind,
    /// The root selection set of the operation
    pub selection_set: SelectionSet,
    /// The variables for the query, coerced into proper values
    pub variables: HashMap<String, qast::Value>,
    pub context: RequestContext,
    pub logger: Logger,

    fragments: HashMap<String, FragmentDefinition>,
    start: Instant,

    /// Used only for logging
    pub query_text: String,
    pub variables_text: String,
}

impl Query {
    /// Processes the raw GraphQL query `query` and prepares it for
    /// execution. If validation fails, all errors found are returned.
    pub fn new(
        logger: &Logger,
        schema: Arc<ApiSchema>,
        query: GraphDataQuery,
        max_depth: u8,
        max_complexity: u64,
    ) -> Result<Arc<Self>, Vec<QueryExecutionError>> {
        let start = Instant::now();
        let operation = qast::get_operation(&query.document, query.operation_name.as_deref())?;

        let kind = match operation {
            q::OperationDefinition::Query(_) | q::OperationDefinition::SelectionSet(_) => {
                OperationKind::Query
            }
            q::OperationDefinition::Mutation(_) => OperationKind::Mutation,
            q::OperationDefinition::Subscription(_) => {
                return Err(vec![QueryExecutionError::NotSupported(
                    "Subscriptions are not supported".to_owned(),
                )])
            }
        };

        let variables = coerce_variables(schema.as_ref(), operation, query.variables.as_ref())?;

        let raw_query = RawQuery {
            schema: schema.as_ref(),
            kind,
            operation,
            fragments: qast::get_fragments(&query.document),
            declared_variables: qast::get_variable_definitions(operation)
                .iter()
                .map(|def| def.name.as_str())
                .collect(),
            variables: &variables,
            validated_fragments: RefCell::new(HashSet::new()),
        };

        // Check the shape first, so that validation does not risk a stack
        // overflow from deeply nested or cyclical fragments
        raw_query.check_shape(max_depth, max_complexity)?;
        raw_query.validate_fields()?;

        let query_text = query
            .document
            .format(&graphql_parser::Style::default().indent(0))
            .replace('\n', " ");
        let variables_text = query
            .variables
            .as_ref()
            .map(|vars| {
                let mut names: Vec<_> = vars.keys().map(String::as_str).collect();
                names.sort_unstable();
                names.join(",")
            })
            .unwrap_or_default();

        let selection_set = qast::get_selection_set(operation).clone();
        let fragments = raw_query
            .fragments
            .iter()
            .map(|(name, def)| (name.to_string(), (*def).clone()))
            .collect();
        let logger = logger.new(o!(
            "operation" => match kind {
                OperationKind::Query => "query",
                OperationKind::Mutation => "mutation",
            }
        ));

        Ok(Arc::new(Query {
            schema,
            kind,
            selection_set,
            variables,
            context: query.context,
            logger,
            fragments,
            start,
            query_text,
            variables_text,
        }))
    }

    /// The object type the root selection set is executed against.
    pub fn root_type(&self) -> &ObjectType {
        match self.kind {
            OperationKind::Query => &self.schema.query_type,
            OperationKind::Mutation => &self.schema.mutation_type,
        }
    }

    pub fn is_mutation(&self) -> bool {
        self.kind == OperationKind::Mutation
    }

    /// Fragments are checked to exist when the query is created, so this
    /// only returns `None` for names the query does not use.
    pub fn get_fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments.get(name)
    }

    /// Log details about the overall execution of the query
    pub fn log_execution(&self, errors: usize) {
        if ENV_VARS.log_query_timing() {
            info!(
                &self.logger,
                "Query timing (GraphQL)";
                "query" => &self.query_text,
                "variables" => &self.variables_text,
                "query_time_ms" => self.start.elapsed().as_millis(),
                "errors" => errors,
            );
        }
    }
}

/// Coerces variable values for an operation. The returned map only
/// contains variables that have a value, either given or by default.
pub fn coerce_variables(
    schema: &ApiSchema,
    operation: &OperationDefinition,
    variables: Option<&QueryVariables>,
) -> Result<HashMap<String, qast::Value>, Vec<QueryExecutionError>> {
    let mut coerced_values = HashMap::new();
    let mut errors = vec![];
    let no_variables = HashMap::new();

    for variable_def in qast::get_variable_definitions(operation) {
        // Skip variable if it has an invalid type
        if !sast::is_input_type(schema.document(), &variable_def.var_type) {
            errors.push(QueryExecutionError::InvalidVariableTypeError(
                variable_def.position,
                variable_def.name.to_owned(),
                variable_def.var_type.to_string(),
            ));
            continue;
        }

        let value = variables
            .and_then(|vars| vars.get(&variable_def.name))
            .or(variable_def.default_value.as_ref());

        let value = match value {
            // No variable value provided and no default for non-null type, fail
            None => {
                if sast::is_non_null_type(&variable_def.var_type) {
                    errors.push(QueryExecutionError::MissingVariableError(
                        variable_def.position,
                        variable_def.name.to_owned(),
                    ));
                }
                continue;
            }
            Some(value) => value,
        };

        // We have a variable value, attempt to coerce it to the value type
        // of the variable definition
        match coerce_value(value, &variable_def.var_type, &no_variables) {
            Some(_) => {
                coerced_values.insert(variable_def.name.to_owned(), value.clone());
            }
            None => errors.push(QueryExecutionError::InvalidVariableError(
                variable_def.position,
                variable_def.name.to_owned(),
                format!("expected {} but got {}", variable_def.var_type, value),
            )),
        }
    }

    if errors.is_empty() {
        Ok(coerced_values)
    } else {
        Err(errors)
    }
}

/// A query while it is being checked; borrows everything from the
/// document.
struct RawQuery<'a> {
    schema: &'a ApiSchema,
    kind: OperationKind,
    operation: &'a OperationDefinition,
    fragments: HashMap<&'a str, &'a FragmentDefinition>,
    declared_variables: HashSet<&'a str>,
    variables: &'a HashMap<String, qast::Value>,
    /// Fragments whose body has been validated already
    validated_fragments: RefCell<HashSet<&'a str>>,
}

/// Nesting and size of a selection set with its fragments expanded.
#[derive(Clone, Copy, Debug, Default)]
struct Shape {
    /// Levels of selection sets below this one
    levels: usize,
    /// Number of selected fields, saturating
    complexity: u64,
}

impl Shape {
    fn field() -> Self {
        Shape {
            levels: 0,
            complexity: 1,
        }
    }

    /// The shape of a field whose selection set has this shape.
    fn nested(self) -> Self {
        Shape {
            levels: self.levels + 1,
            complexity: self.complexity.saturating_add(1),
        }
    }

    fn merge(self, other: Shape) -> Self {
        Shape {
            levels: self.levels.max(other.levels),
            complexity: self.complexity.saturating_add(other.complexity),
        }
    }
}

struct ShapeLimits<'a> {
    max_depth: usize,
    /// `None` while the fragment is being summarized
    fragments: HashMap<&'a str, Option<Shape>>,
}

impl ShapeLimits<'_> {
    fn too_deep(&self) -> QueryExecutionError {
        QueryExecutionError::TooDeep(u8::try_from(self.max_depth).unwrap_or(u8::MAX))
    }
}

impl<'a> RawQuery<'a> {
    /// Checks nesting depth, fragment cycles and the number of selected
    /// fields. Each fragment is summarized once no matter how often it is
    /// spread, so this is linear in the size of the document.
    fn check_shape(
        &self,
        max_depth: u8,
        max_complexity: u64,
    ) -> Result<u64, Vec<QueryExecutionError>> {
        let mut limits = ShapeLimits {
            max_depth: max_depth as usize,
            fragments: HashMap::new(),
        };
        let shape = self
            .shape(qast::get_selection_set(self.operation), 1, &mut limits)
            .map_err(|e| vec![e])?;
        if shape.complexity > max_complexity {
            return Err(vec![QueryExecutionError::TooComplex(
                shape.complexity,
                max_complexity,
            )]);
        }
        Ok(shape.complexity)
    }

    fn shape(
        &self,
        selection_set: &'a SelectionSet,
        depth: usize,
        limits: &mut ShapeLimits<'a>,
    ) -> Result<Shape, QueryExecutionError> {
        if depth > limits.max_depth {
            return Err(limits.too_deep());
        }

        let mut shape = Shape::default();
        for selection in &selection_set.items {
            let inner = match selection {
                q::Selection::Field(field) => {
                    // Empty selection sets are the base case
                    if field.selection_set.items.is_empty() {
                        Shape::field()
                    } else {
                        self.shape(&field.selection_set, depth + 1, limits)?.nested()
                    }
                }
                q::Selection::FragmentSpread(spread) => {
                    self.fragment_shape(spread, depth, limits)?
                }
                q::Selection::InlineFragment(fragment) => {
                    self.shape(&fragment.selection_set, depth, limits)?
                }
            };
            shape = shape.merge(inner);
        }
        Ok(shape)
    }

    fn fragment_shape(
        &self,
        spread: &'a q::FragmentSpread<'static, String>,
        depth: usize,
        limits: &mut ShapeLimits<'a>,
    ) -> Result<Shape, QueryExecutionError> {
        let name = spread.fragment_name.as_str();
        match limits.fragments.get(name) {
            Some(Some(shape)) => {
                if depth + shape.levels > limits.max_depth {
                    return Err(limits.too_deep());
                }
                return Ok(*shape);
            }
            Some(None) => {
                return Err(QueryExecutionError::CyclicalFragment(
                    spread.position,
                    spread.fragment_name.clone(),
                ))
            }
            None => {}
        }

        // Undefined fragments are reported by `validate_fields`
        let def = match self.fragments.get(name).copied() {
            Some(def) => def,
            None => return Ok(Shape::default()),
        };

        limits.fragments.insert(name, None);
        let shape = self.shape(&def.selection_set, depth, limits)?;
        limits.fragments.insert(name, Some(shape));
        Ok(shape)
    }

    fn validate_fields(&self) -> Result<(), Vec<QueryExecutionError>> {
        let root_type = match self.kind {
            OperationKind::Query => &self.schema.query_type,
            OperationKind::Mutation => &self.schema.mutation_type,
        };

        let mut errors = vec![];
        self.validate_selection_set(
            root_type,
            qast::get_selection_set(self.operation),
            true,
            &mut errors,
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_selection_set(
        &self,
        object_type: &ObjectType,
        selection_set: &'a SelectionSet,
        is_root: bool,
        errors: &mut Vec<QueryExecutionError>,
    ) {
        for selection in &selection_set.items {
            self.validate_directives(qast::get_directives(selection), errors);

            match selection {
                q::Selection::Field(field) => {
                    self.validate_field(object_type, field, is_root, errors)
                }
                q::Selection::FragmentSpread(spread) => {
                    match self.fragments.get(spread.fragment_name.as_str()).copied() {
                        Some(def) => {
                            let q::TypeCondition::On(type_name) = &def.type_condition;
                            if !self.check_type_condition(
                                object_type,
                                type_name,
                                spread.position,
                                errors,
                            ) {
                                continue;
                            }
                            // The type condition pins the object type, so the
                            // body only needs checking once
                            let first_spread = self
                                .validated_fragments
                                .borrow_mut()
                                .insert(spread.fragment_name.as_str());
                            if first_spread {
                                self.validate_selection_set(
                                    object_type,
                                    &def.selection_set,
                                    is_root,
                                    errors,
                                );
                            }
                        }
                        None => errors.push(QueryExecutionError::UndefinedFragment(
                            spread.position,
                            spread.fragment_name.clone(),
                        )),
                    }
                }
                q::Selection::InlineFragment(fragment) => {
                    let applies = match &fragment.type_condition {
                        Some(q::TypeCondition::On(type_name)) => self.check_type_condition(
                            object_type,
                            type_name,
                            fragment.position,
                            errors,
                        ),
                        None => true,
                    };
                    if applies {
                        self.validate_selection_set(
                            object_type,
                            &fragment.selection_set,
                            is_root,
                            errors,
                        );
                    }
                }
            }
        }
    }

    /// Object types have no interfaces or unions here, so a fragment only
    /// applies to the exact type it names.
    fn check_type_condition(
        &self,
        object_type: &ObjectType,
        type_name: &str,
        pos: Pos,
        errors: &mut Vec<QueryExecutionError>,
    ) -> bool {
        if type_name == object_type.name {
            true
        } else {
            errors.push(QueryExecutionError::InvalidFragmentType(
                pos,
                type_name.to_owned(),
                object_type.name.clone(),
            ));
            false
        }
    }

    fn validate_field(
        &self,
        object_type: &ObjectType,
        field: &'a qast::Field,
        is_root: bool,
        errors: &mut Vec<QueryExecutionError>,
    ) {
        for (_, value) in &field.arguments {
            self.validate_variable_usage(field.position, value, errors);
        }

        if field.name == "__typename" {
            if let Some((name, _)) = field.arguments.first() {
                errors.push(QueryExecutionError::UnknownArgument(
                    field.position,
                    field.name.clone(),
                    name.clone(),
                ));
            }
            if !field.selection_set.items.is_empty() {
                errors.push(QueryExecutionError::UnexpectedSelectionSet(
                    field.position,
                    field.name.clone(),
                    "String".to_owned(),
                ));
            }
            return;
        }

        let field_def = match sast::get_field(object_type, &field.name) {
            Some(def) => def,
            None => {
                errors.push(QueryExecutionError::UnknownField(
                    field.position,
                    object_type.name.clone(),
                    field.name.clone(),
                ));
                return;
            }
        };

        match coerce_argument_values(field_def, field, self.variables) {
            Ok(arguments) => {
                if is_root && self.kind == OperationKind::Mutation {
                    self.validate_mutation_input(field, arguments, errors);
                }
            }
            Err(errs) => errors.extend(errs),
        }

        let type_name = sast::get_base_type(&field_def.field_type);
        match self.schema.object_type(type_name) {
            Some(field_type) => {
                if field.selection_set.items.is_empty() {
                    errors.push(QueryExecutionError::MissingSelectionSet(
                        field.position,
                        field.name.clone(),
                        type_name.to_owned(),
                    ));
                } else {
                    self.validate_selection_set(field_type, &field.selection_set, false, errors);
                }
            }
            None => {
                if !field.selection_set.items.is_empty() {
                    errors.push(QueryExecutionError::UnexpectedSelectionSet(
                        field.position,
                        field.name.clone(),
                        type_name.to_owned(),
                    ));
                }
            }
        }
    }

    /// Checks the arguments of a create or update mutation against the
    /// type descriptor of the entity it changes.
    fn validate_mutation_input(
        &self,
        field: &qast::Field,
        mut arguments: Object,
        errors: &mut Vec<QueryExecutionError>,
    ) {
        let internal_name = names::to_internal(&field.name);
        let input = match self.schema.mutation_input(&internal_name) {
            Some(input) => input,
            None => return,
        };

        if input.mode == InputMode::Update {
            if let Some(key) = input.descriptor.key_field() {
                arguments.remove(key.name);
            }
        }

        if let Err(e) = input.descriptor.validate_input(&arguments, input.mode) {
            errors.push(QueryExecutionError::InvalidInput(
                field.position,
                field.name.clone(),
                e,
            ));
        }
    }

    fn validate_directives(
        &self,
        directives: &'a [qast::Directive],
        errors: &mut Vec<QueryExecutionError>,
    ) {
        for directive in directives {
            if directive.name != "skip" && directive.name != "include" {
                errors.push(QueryExecutionError::NotSupported(format!(
                    "directive @{}",
                    directive.name
                )));
                continue;
            }
            match qast::get_argument_value(&directive.arguments, "if") {
                Some(value) => {
                    self.validate_variable_usage(directive.position, value, errors);
                    let boolean = s::Type::NonNullType(Box::new(s::Type::NamedType(
                        "Boolean".to_owned(),
                    )));
                    if coerce_value(value, &boolean, self.variables).is_none() {
                        errors.push(QueryExecutionError::InvalidArgumentError(
                            directive.position,
                            "if".to_owned(),
                            format!("expected Boolean! but got {}", value),
                        ));
                    }
                }
                None => errors.push(QueryExecutionError::MissingArgumentError(
                    directive.position,
                    "if".to_owned(),
                )),
            }
        }
    }

    /// Reports references to variables the operation does not declare.
    fn validate_variable_usage(
        &self,
        pos: Pos,
        value: &qast::Value,
        errors: &mut Vec<QueryExecutionError>,
    ) {
        match value {
            q::Value::Variable(name) => {
                if !self.declared_variables.contains(name.as_str()) {
                    errors.push(QueryExecutionError::UndefinedVariable(pos, name.clone()));
                }
            }
            q::Value::List(values) => {
                for value in values {
                    self.validate_variable_usage(pos, value, errors);
                }
            }
            q::Value::Object(object) => {
                for value in object.values() {
                    self.validate_variable_usage(pos, value, errors);
                }
            }
            _ => {}
        }
    }
}
