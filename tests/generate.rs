mod common;

use std::collections::BTreeSet;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;

use kodgen::codegen::GenerationForces;

/* -------------------------------------------------------------------------- */
/*                        Aggregated-Unit Test Cases                          */
/* -------------------------------------------------------------------------- */

#[test]
fn test_aggregated_single_data_class() {
    // Given: A single header with one Data class.
    let ctx = common::TestContext::new();
    ctx.create_header(
        "SomeClass.h",
        "#pragma once\n\nclass KGClass(Data) SomeClass\n{\n};\n",
    );

    // When: Running the all-files strategy with the Data unit.
    let result = ctx.manager().run_one_generate_for_all_files(
        &common::parser(true),
        &ctx.data_unit(),
        GenerationForces::all(),
    );

    // Then: The run completed and the artifact aggregates the class.
    assert!(result.completed, "errors: {:?}", result.errors);

    let artifact = ctx.read_generated("DataState.h.hpp");
    assert!(artifact.contains("#include \"SomeClass.h\""));
    assert!(artifact.contains("std::vector<SomeClass> data_SomeClass;"));
    assert!(artifact.contains("DataType_SomeClass,"));

    // Then: The count enumerator terminates the enum.
    assert!(artifact.contains("DataType_SomeClass,\nDataType_COUNT\n};"));
}

#[test]
fn test_aggregated_two_data_classes() {
    // Given: Two headers with one Data class each.
    let ctx = common::TestContext::new();
    ctx.create_header("A.h", "class KGClass(Data) A {};\n");
    ctx.create_header("B.h", "class KGClass(Data) B {};\n");

    // When: Running the all-files strategy.
    let result = ctx.manager().run_one_generate_for_all_files(
        &common::parser(true),
        &ctx.data_unit(),
        GenerationForces::all(),
    );

    // Then: The enum lists both types in input-iteration order, terminated
    // by the count enumerator.
    assert!(result.completed, "errors: {:?}", result.errors);
    let artifact = ctx.read_generated("DataState.h.hpp");
    assert!(artifact.contains("DataType_A,\nDataType_B,\nDataType_COUNT"));

    // Then: The function-pointer array has exactly two entries and no
    // trailing comma.
    assert!(artifact.contains(
        "&DataState::template GetDatasPtrVar<DataType_A>,\n&DataState::template GetDatasPtrVar<DataType_B>\n};"
    ));
    assert_eq!(artifact.matches("GetDatasPtrVar<DataType_").count(), 2);
}

/* -------------------------------------------------------------------------- */
/*                         Macro-Unit Test Cases                              */
/* -------------------------------------------------------------------------- */

#[test]
fn test_macro_unit_const_pointer_getter() {
    // Given: A class with a float field carrying Get[const, *] and Set.
    let ctx = common::TestContext::new();
    ctx.create_header(
        "SomeClass.h",
        r#"
        #pragma once

        class KGClass() SomeClass
        {
            private:
                KGField(Get[const, *], Set)
                float _someFloat = 3.14f;
        };
        "#,
    );

    // When: Running the per-file strategy with the accessor unit.
    let result = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &ctx.accessor_unit(),
        GenerationForces::all(),
    );

    // Then: The class footer declares a const pointer-to-const getter and
    // the generated source defines it.
    assert!(result.completed, "errors: {:?}", result.errors);

    let header = ctx.read_generated("SomeClass.h.h");
    assert!(header.contains("#define SomeClass_GENERATED"));
    assert!(header.contains("float  const * getSomeFloat() const;"));
    assert!(header.contains("void setSomeFloat(float value);"));

    let source = ctx.read_generated("SomeClass.src.h");
    assert!(source.contains("#include \"SomeClass.h\""));
    assert!(
        source.contains("float  const * SomeClass::getSomeFloat() const { return &_someFloat; }")
    );
    assert!(source.contains("void SomeClass::setSomeFloat(float value) { _someFloat = value; }"));
}

#[test]
fn test_macro_unit_explicit_getter_has_no_definition() {
    // Given: A field whose getter is marked explicit.
    let ctx = common::TestContext::new();
    ctx.create_header(
        "Holder.h",
        r#"
        class KGClass() Holder
        {
            KGField(Get[explicit])
            int _someInt = 2;
        };
        "#,
    );

    // When: Running the per-file strategy.
    let result = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &ctx.accessor_unit(),
        GenerationForces::all(),
    );

    // Then: The declaration exists but the source carries no definition.
    assert!(result.completed, "errors: {:?}", result.errors);
    let header = ctx.read_generated("Holder.h.h");
    assert!(header.contains("int getSomeInt() const;"));

    let source = ctx.read_generated("Holder.src.h");
    assert!(!source.contains("::getSomeInt"));
}

#[test]
fn test_macro_unit_qualified_class_footer_macro() {
    // Given: A reflected class nested in annotated namespaces.
    let ctx = common::TestContext::new();
    ctx.create_header(
        "Nested.h",
        r#"
        namespace SomeNamespace KGNamespace()
        {
            namespace np1 KGNamespace()
            {
                class KGClass() SomeClass
                {
                    KGField(Get)
                    char _someChar = '*';
                };
            }
        }
        "#,
    );

    // When: Running the per-file strategy.
    let result = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &ctx.accessor_unit(),
        GenerationForces::all(),
    );

    // Then: The footer macro flattens the qualified class path and the
    // definition qualifies the accessor with it.
    assert!(result.completed, "errors: {:?}", result.errors);
    let header = ctx.read_generated("Nested.h.h");
    assert!(header.contains("#define SomeNamespace_np1_SomeClass_GENERATED"));
    assert!(header.contains("#define File_Nested_GENERATED"));

    let source = ctx.read_generated("Nested.src.h");
    assert!(source.contains(
        "char SomeNamespace::np1::SomeClass::getSomeChar() const { return _someChar; }"
    ));
}

/* -------------------------------------------------------------------------- */
/*                        Error-Propagation Test Cases                        */
/* -------------------------------------------------------------------------- */

#[test]
fn test_unknown_property_skips_emission() {
    // Given: A field annotated with an unregistered property, strict mode.
    let ctx = common::TestContext::new();
    let header = ctx.create_header(
        "Bad.h",
        r#"
        class KGClass() Bad
        {
            KGField(NotARule)
            int _value = 0;
        };
        "#,
    );

    // When: Parsing directly.
    let parse_result = common::parser(true).parse(&header);

    // Then: Exactly one unknown-property error at the field's location, and
    // no field entity in the model.
    assert_eq!(parse_result.errors.len(), 1);
    assert!(parse_result.errors[0].kind.is_unknown_property());
    assert!(
        parse_result
            .entities()
            .all(|e| e.kind != kodgen::entity::EntityKind::Field)
    );

    // When: Running the per-file strategy over the same file.
    let result = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &ctx.accessor_unit(),
        GenerationForces::all(),
    );

    // Then: The generate task observed the errors and skipped emission.
    assert!(!result.completed);
    assert!(!result.errors.is_empty());
    assert!(!ctx.generated_path().join("Bad.h.h").exists());
}

#[test]
fn test_failing_file_does_not_poison_others() {
    // Given: One good header and one with an unknown property.
    let ctx = common::TestContext::new();
    ctx.create_header(
        "Good.h",
        "class KGClass() Good { KGField(Get) int _x = 0; };\n",
    );
    ctx.create_header(
        "Bad.h",
        "class KGClass() Bad { KGField(NotARule) int _y = 0; };\n",
    );

    // When: Running the per-file strategy.
    let result = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &ctx.accessor_unit(),
        GenerationForces::all(),
    );

    // Then: The run reports failure, but the good file's artifacts exist.
    assert!(!result.completed);
    assert!(ctx.generated_path().join("Good.h.h").exists());
    assert!(!ctx.generated_path().join("Bad.h.h").exists());
}

/* -------------------------------------------------------------------------- */
/*                        Manager-Behavior Test Cases                         */
/* -------------------------------------------------------------------------- */

#[test]
fn test_parsed_files_union_matches_inputs() {
    // Given: Three input headers.
    let ctx = common::TestContext::new();
    let expected: BTreeSet<PathBuf> = ["A.h", "B.h", "C.h"]
        .iter()
        .map(|name| ctx.create_header(name, "class KGClass() X {};\n"))
        .collect();

    // When: Running the per-file strategy on a multi-worker pool.
    let result = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &ctx.accessor_unit(),
        GenerationForces::all(),
    );

    // Then: The union of parsed files equals the identified input set.
    let parsed: BTreeSet<PathBuf> = result.parsed_files.iter().cloned().collect();
    assert_eq!(parsed, expected);
    assert!(result.completed, "errors: {:?}", result.errors);
}

#[test]
fn test_two_iteration_unit_is_stable() {
    // Given: A two-iteration accessor unit over one header.
    let ctx = common::TestContext::new();
    let header = ctx.create_header(
        "SomeClass.h",
        "class KGClass() SomeClass { KGField(Get) int _x = 0; };\n",
    );

    let mut unit = ctx.accessor_unit();
    unit.set_iteration_count(2);

    // When: Running the per-file strategy.
    let result = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &unit,
        GenerationForces::all(),
    );

    // Then: Both iterations completed against the same file set, and the
    // run duration is measured.
    assert!(result.completed, "errors: {:?}", result.errors);
    assert_eq!(result.parsed_files, vec![header]);
    assert!(result.duration_secs >= 0.0);
    assert!(ctx.generated_path().join("SomeClass.h.h").exists());
}

#[test]
fn test_zero_input_files_completes_trivially() {
    // Given: An empty input directory.
    let ctx = common::TestContext::new();

    // When: Running both strategies.
    let each = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &ctx.accessor_unit(),
        GenerationForces::all(),
    );
    let all = ctx.manager().run_one_generate_for_all_files(
        &common::parser(true),
        &ctx.data_unit(),
        GenerationForces::all(),
    );

    // Then: Both complete with empty file sets.
    assert!(each.completed && all.completed);
    assert!(each.parsed_files.is_empty() && all.parsed_files.is_empty());
}

#[test]
fn test_zero_iteration_count_is_rejected_at_setup() {
    // Given: A unit advertising zero iterations.
    let ctx = common::TestContext::new();
    ctx.create_header("A.h", "class KGClass() A {};\n");

    let mut unit = ctx.accessor_unit();
    unit.set_iteration_count(0);

    // When: Running the per-file strategy.
    let result = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &unit,
        GenerationForces::all(),
    );

    // Then: Setup fails before any task runs.
    assert!(!result.completed);
    assert!(result.parsed_files.is_empty());
    assert!(
        result
            .errors
            .iter()
            .any(|e| matches!(e, kodgen::codegen::CodeGenError::SetupInvalid(_)))
    );
}

#[test]
fn test_macros_helper_file_is_emitted() {
    // Given: One input header.
    let ctx = common::TestContext::new();
    ctx.create_header("A.h", "class KGClass() A {};\n");

    // When: Running the per-file strategy.
    let result = ctx.manager().run_one_generate_for_each_file(
        &common::parser(true),
        &ctx.accessor_unit(),
        GenerationForces::all(),
    );

    // Then: The helper header defines every annotation macro away.
    assert!(result.completed, "errors: {:?}", result.errors);
    let macros = ctx.read_generated("EntityMacros.h");
    assert!(macros.contains("#ifndef KODGEN_PARSING"));
    assert!(macros.contains("#define KGClass(...)"));
    assert!(macros.contains("#define KGField(...)"));
    assert!(macros.contains("#define KGEnumVal(...)"));
}

/* -------------------------------------------------------------------------- */
/*                              CLI Test Cases                                */
/* -------------------------------------------------------------------------- */

#[test]
fn test_cli_generates_both_artifact_families() -> Result<(), Box<dyn std::error::Error>> {
    // Given: A working directory shaped like a user project.
    let ctx = common::TestContext::new();
    ctx.create_header(
        "SomeClass.h",
        r#"
        #pragma once

        class KGClass(Data) SomeClass
        {
            private:
                KGField(Get[const, *], Set)
                float _someFloat = 3.14f;
        };
        "#,
    );

    // When: Invoking the CLI with the working directory.
    cargo_bin_cmd!("kodgen")
        .arg(ctx.working_dir.path())
        .assert()
        .success();

    // Then: Both artifact families and the macro helper exist.
    assert!(ctx.generated_path().join("SomeClass.h.h").exists());
    assert!(ctx.generated_path().join("SomeClass.src.h").exists());
    assert!(ctx.generated_path().join("DataState.h.hpp").exists());
    assert!(ctx.generated_path().join("EntityMacros.h").exists());

    Ok(())
}

#[test]
fn test_cli_rejects_missing_argument() {
    // Given: No working directory argument.
    // When: Invoking the CLI.
    // Then: It exits non-zero.
    cargo_bin_cmd!("kodgen").assert().failure();
}

#[test]
fn test_cli_rejects_invalid_working_directory() {
    // Given: A working directory that does not exist.
    // When: Invoking the CLI.
    // Then: It exits non-zero.
    cargo_bin_cmd!("kodgen")
        .arg("/definitely/not/a/real/directory")
        .assert()
        .failure();
}
