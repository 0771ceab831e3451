use derive_builder::Builder;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::log::LogSeverity;
use crate::log::SharedLogger;
use crate::parsing::FileParser;
use crate::parsing::FileParsingResult;
use crate::pool::TaskHandle;
use crate::pool::ThreadPool;

use super::CodeGenEnv;
use super::CodeGenError;
use super::CodeGenResult;
use super::CodeGenUnit;
use super::GeneratedFile;

/* -------------------------------------------------------------------------- */
/*                       Struct: CodeGenManagerSettings                       */
/* -------------------------------------------------------------------------- */

/// `CodeGenManagerSettings` tells the manager where input files live: the
/// directories to walk, the directories to leave alone, and the file
/// extensions that count as inputs.
#[derive(Builder, Clone, Debug, Default)]
#[builder(default)]
pub struct CodeGenManagerSettings {
    pub ignored_directories: Vec<PathBuf>,
    /// Extensions including their leading dot, e.g. `.h`.
    pub supported_extensions: Vec<String>,
    pub to_process_directories: Vec<PathBuf>,
}

/* -------------------------------------------------------------------------- */
/*                          Struct: GenerationForces                          */
/* -------------------------------------------------------------------------- */

/// `GenerationForces` overrides the freshness analysis: reparse and/or
/// regenerate files the unit reports as up to date.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenerationForces {
    pub force_regenerate_all: bool,
    pub force_reparse_all: bool,
}

impl GenerationForces {
    pub fn all() -> Self {
        GenerationForces {
            force_regenerate_all: true,
            force_reparse_all: true,
        }
    }

    fn any(self) -> bool {
        self.force_regenerate_all || self.force_reparse_all
    }
}

/* -------------------------------------------------------------------------- */
/*                           Struct: CodeGenManager                           */
/* -------------------------------------------------------------------------- */

/// `CodeGenManager` runs one generation end to end: it validates the setup,
/// decides which input files are stale, emits the annotation-macro helper
/// header, schedules parse and generate tasks on its worker pool, and merges
/// the per-task results into one aggregate.
///
/// The parser and unit passed to a run are templates; every task operates on
/// its own clone.
pub struct CodeGenManager {
    logger: SharedLogger,
    pool: ThreadPool,
    pub settings: CodeGenManagerSettings,
}

impl CodeGenManager {
    pub fn new(logger: SharedLogger) -> Self {
        CodeGenManager {
            logger,
            pool: ThreadPool::with_default_workers(),
            settings: CodeGenManagerSettings::default(),
        }
    }

    /// `with_workers` sizes the pool explicitly; mainly for tests.
    pub fn with_workers(logger: SharedLogger, workers: usize) -> Self {
        CodeGenManager {
            logger,
            pool: ThreadPool::new(workers),
            settings: CodeGenManagerSettings::default(),
        }
    }

    /* ------------------------- Strategy: one per file ------------------------- */

    /// `run_one_generate_for_each_file` parses every input concurrently and
    /// runs one generation (on a fresh unit clone and environment) per file,
    /// as a task depending on that file's parse. With an iteration count
    /// above 1 the whole batch repeats, joining between iterations so a later
    /// iteration's parse sees the previous one's artifacts.
    pub fn run_one_generate_for_each_file(
        &self,
        parser: &FileParser,
        unit: &dyn CodeGenUnit,
        forces: GenerationForces,
    ) -> CodeGenResult {
        let start = Instant::now();
        let mut gen_result = CodeGenResult {
            completed: true,
            ..CodeGenResult::default()
        };

        let Some(files) = self.prepare_run(parser, unit, forces, &mut gen_result) else {
            gen_result.duration_secs = start.elapsed().as_secs_f32();
            return gen_result;
        };

        let iteration_count = unit.iteration_count();
        let mut generation_tasks: Vec<TaskHandle<CodeGenResult>> =
            Vec::with_capacity(files.len() * usize::from(iteration_count));

        for iteration in 0..iteration_count {
            // Pause the pool so a whole iteration's tasks land in the queue
            // without workers competing for the mutex mid-batch.
            self.pool.set_running(false);

            for file in &files {
                gen_result.record_parsed_file(file.clone());

                let parser = parser.clone();
                let parse_file = file.clone();
                let parse_task = self.pool.submit(
                    format!("Parsing {} ({iteration})", parse_file.display()),
                    Vec::new(),
                    move || parser.parse(&parse_file),
                );

                let unit = unit.clone_boxed();
                let logger = self.logger.clone();
                let parse_handle = parse_task.clone();
                let generate_task = self.pool.submit(
                    format!("Generation {} ({iteration})", file.display()),
                    vec![parse_task.dependency()],
                    move || generate_for_file(unit, &parse_handle, &logger),
                );

                generation_tasks.push(generate_task);
            }

            // An iteration strictly depends on the previous one.
            self.pool.set_running(true);
            self.pool.join();
        }

        for task in generation_tasks {
            if let Some(result) = task.take_result() {
                gen_result.merge(result);
            }
        }

        gen_result.duration_secs = start.elapsed().as_secs_f32();
        gen_result
    }

    /* ------------------------- Strategy: one for all -------------------------- */

    /// `run_one_generate_for_all_files` parses every input concurrently,
    /// joins, then runs a single-threaded generation pass over all results:
    /// one environment, one `pre_generate_code`, one `generate_code` per
    /// parse result in submission order (stopping on the first failure), one
    /// `post_generate_code`. The single-threaded section is what lets the
    /// unit aggregate across files into shared buffers.
    pub fn run_one_generate_for_all_files(
        &self,
        parser: &FileParser,
        unit: &dyn CodeGenUnit,
        forces: GenerationForces,
    ) -> CodeGenResult {
        let start = Instant::now();
        let mut gen_result = CodeGenResult {
            completed: true,
            ..CodeGenResult::default()
        };

        let Some(files) = self.prepare_run(parser, unit, forces, &mut gen_result) else {
            gen_result.duration_secs = start.elapsed().as_secs_f32();
            return gen_result;
        };

        for iteration in 0..unit.iteration_count() {
            self.pool.set_running(false);

            let mut parse_tasks: Vec<TaskHandle<FileParsingResult>> =
                Vec::with_capacity(files.len());

            for file in &files {
                gen_result.record_parsed_file(file.clone());

                let parser = parser.clone();
                let parse_file = file.clone();
                parse_tasks.push(self.pool.submit(
                    format!("Parsing {} ({iteration})", parse_file.display()),
                    Vec::new(),
                    move || parser.parse(&parse_file),
                ));
            }

            self.pool.set_running(true);
            self.pool.join();

            // Retrieve each parse result from the task it came from.
            let mut results = Vec::with_capacity(parse_tasks.len());
            let mut parse_ok = true;

            for task in parse_tasks {
                let Some(result) = task.take_result() else {
                    parse_ok = false;
                    continue;
                };

                if !result.errors.is_empty() {
                    parse_ok = false;
                    self.report_parse_errors(&result, &mut gen_result);
                }

                results.push(result);
            }

            if !parse_ok {
                gen_result.completed = false;
                continue;
            }

            let mut unit = unit.clone_boxed();
            let mut env = unit.create_env(self.logger.clone());

            let mut ok = unit.pre_generate_code(&mut env);
            for result in results {
                if !ok {
                    break;
                }
                ok &= unit.generate_code(Arc::new(result), &mut env);
            }
            if ok {
                ok &= unit.post_generate_code(&mut env);
            }

            if !ok {
                gen_result.completed = false;
            }
        }

        gen_result.duration_secs = start.elapsed().as_secs_f32();
        gen_result
    }

    /* ------------------------------ Run plumbing ------------------------------ */

    /// `prepare_run` validates the setup, identifies stale input files, and
    /// emits the macro helper header. Returns `None` when the run should end
    /// early (setup failure, or nothing to do).
    fn prepare_run(
        &self,
        parser: &FileParser,
        unit: &dyn CodeGenUnit,
        forces: GenerationForces,
        gen_result: &mut CodeGenResult,
    ) -> Option<Vec<PathBuf>> {
        if let Err(error) = self.check_generation_setup(unit) {
            self.logger
                .log(LogSeverity::Error, &error.to_string());
            gen_result.completed = false;
            gen_result.errors.push(error);
            return None;
        }

        let files = self.identify_files_to_process(unit, forces);

        if files.is_empty() {
            return None;
        }

        if let Err(error) = self.generate_macros_file(parser, unit) {
            self.logger
                .log(LogSeverity::Error, &error.to_string());
            gen_result.completed = false;
            gen_result.errors.push(error);
            return None;
        }

        Some(files)
    }

    /// `check_generation_setup` fails fast on configuration the run cannot
    /// proceed with.
    fn check_generation_setup(&self, unit: &dyn CodeGenUnit) -> Result<(), CodeGenError> {
        if unit.iteration_count() == 0 {
            return Err(CodeGenError::SetupInvalid(
                "unit iteration count must be at least 1".to_string(),
            ));
        }

        if self.settings.supported_extensions.is_empty() {
            return Err(CodeGenError::SetupInvalid(
                "no supported file extensions configured".to_string(),
            ));
        }

        for directory in &self.settings.to_process_directories {
            if !directory.is_dir() {
                return Err(CodeGenError::SetupInvalid(format!(
                    "to-process directory {directory:?} is not a directory"
                )));
            }
        }

        std::fs::create_dir_all(unit.output_directory()).map_err(|error| {
            CodeGenError::SetupInvalid(format!(
                "cannot create output directory {:?}: {error}",
                unit.output_directory()
            ))
        })
    }

    /// `identify_files_to_process` walks the to-process directories,
    /// intersects with the supported extensions, subtracts ignored
    /// directories, and drops files the unit reports as up to date (unless
    /// forced). The result is sorted, which fixes the submission order the
    /// all-files strategy generates in.
    fn identify_files_to_process(
        &self,
        unit: &dyn CodeGenUnit,
        forces: GenerationForces,
    ) -> Vec<PathBuf> {
        let mut files = BTreeSet::new();

        for directory in &self.settings.to_process_directories {
            self.collect_files(directory, &mut files);
        }

        files
            .into_iter()
            .filter(|file| forces.any() || !unit.is_up_to_date(file))
            .collect()
    }

    fn collect_files(&self, directory: &Path, out: &mut BTreeSet<PathBuf>) {
        if self
            .settings
            .ignored_directories
            .iter()
            .any(|ignored| directory.starts_with(ignored))
        {
            return;
        }

        let entries = match std::fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(error) => {
                self.logger.log(
                    LogSeverity::Warning,
                    &format!("cannot read directory {directory:?}: {error}"),
                );
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();

            if path.is_dir() {
                self.collect_files(&path, out);
            } else if self.is_supported(&path) {
                out.insert(path);
            }
        }
    }

    fn is_supported(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let extension = format!(".{extension}");

        self.settings
            .supported_extensions
            .iter()
            .any(|supported| *supported == extension)
    }

    /// `generate_macros_file` emits the helper header defining every
    /// annotation macro away for normal compilation; the generator's own
    /// invocation overrides them through the compiler arguments.
    fn generate_macros_file(
        &self,
        parser: &FileParser,
        unit: &dyn CodeGenUnit,
    ) -> Result<(), CodeGenError> {
        let path = unit.output_directory().join("EntityMacros.h");
        let mut file = GeneratedFile::new(&path);

        file.write_line("#pragma once");
        file.write_line("");
        file.write_line("#ifndef KODGEN_PARSING");

        for (name, _) in parser.settings().macro_names.tag_pairs() {
            file.write_line(&format!("#define {name}(...)"));
        }

        file.write_line("#endif");

        file.commit()
            .map_err(|error| CodeGenError::OutputWriteFailed(path, error.to_string()))
    }

    fn report_parse_errors(&self, result: &FileParsingResult, gen_result: &mut CodeGenResult) {
        for error in &result.errors {
            self.logger.log(LogSeverity::Error, &error.to_string());
            gen_result.errors.push(CodeGenError::Parsing {
                error: error.clone(),
                file: result.parsed_file.clone(),
            });
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                           Fn: GenerateForFile                              */
/* -------------------------------------------------------------------------- */

/// `generate_for_file` is the body of one per-file generation task: retrieve
/// the parse result from the dependency, and only when it is error-free run
/// the unit's three stages against a fresh environment. A parse with errors
/// skips emission and leaves the task incomplete.
fn generate_for_file(
    mut unit: Box<dyn CodeGenUnit>,
    parse_task: &TaskHandle<FileParsingResult>,
    logger: &SharedLogger,
) -> CodeGenResult {
    let mut out = CodeGenResult::default();

    let Some(parsing_result) = parse_task.take_result() else {
        return out;
    };

    out.record_parsed_file(parsing_result.parsed_file.clone());

    if parsing_result.errors.is_empty() {
        let parsing_result = Arc::new(parsing_result);
        let mut env = unit.create_env(logger.clone());

        let ok = unit.pre_generate_code(&mut env)
            && unit.generate_code(parsing_result.clone(), &mut env)
            && unit.post_generate_code(&mut env);

        out.completed = ok;
    } else {
        for error in &parsing_result.errors {
            logger.log(LogSeverity::Error, &error.to_string());
            out.errors.push(CodeGenError::Parsing {
                error: error.clone(),
                file: parsing_result.parsed_file.clone(),
            });
        }
    }

    out
}
