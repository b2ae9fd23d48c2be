use hdb_common::Config;
use hdb_engine::{
    contract_address, format_address, start_debugger, Argument, BuildConfig, Bytecode,
    CommandDispatcher, Compiler, DebugError, DebugRequest, DebugSession, Deployer,
    DirectDispatcher, Dispatch, ErrorReporter, FlattenedSource, Hevm, Huffc, Stage,
    TempFileDispatcher, Terminal, ToolError, Toolchain,
};
use std::{
    fs, io,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

const RUNTIME: &str = "0x60043560005260206000f3";

#[derive(Default)]
struct FakeCompiler {
    sources: Mutex<Vec<String>>,
    fail: bool,
}

impl Compiler for FakeCompiler {
    fn name(&self) -> &str {
        "fake-huffc"
    }

    fn check_installed(&self) -> Result<(), ToolError> {
        Ok(())
    }

    fn compile(
        &self,
        source: &FlattenedSource,
        _cwd: &Path,
        _config: &BuildConfig,
    ) -> Result<Bytecode, ToolError> {
        self.sources.lock().unwrap().push(source.as_str().to_string());
        if self.fail {
            return Err(ToolError::InvalidOutput { tool: "fake-huffc".into(), output: String::new() });
        }
        Ok(Bytecode::from_tool_output("0x600b8060093d393df3").unwrap())
    }
}

#[derive(Default)]
struct FakeDeployer {
    deployed: Mutex<Vec<(Bytecode, bool)>>,
}

impl Deployer for FakeDeployer {
    fn name(&self) -> &str {
        "fake-hevm"
    }

    fn check_installed(&self, _config: &BuildConfig) -> Result<(), ToolError> {
        Ok(())
    }

    fn deploy(
        &self,
        bytecode: &Bytecode,
        _cwd: &Path,
        config: &BuildConfig,
    ) -> Result<Bytecode, ToolError> {
        self.deployed.lock().unwrap().push((bytecode.clone(), config.state));
        Ok(Bytecode::from_tool_output(RUNTIME).unwrap())
    }
}

#[derive(Default)]
struct FakeTerminal {
    scripts: Mutex<Vec<String>>,
}

impl Terminal for FakeTerminal {
    fn run_shell(&self, script: &str) -> io::Result<()> {
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(())
    }

    fn run_program(&self, program: &str, args: &[String]) -> io::Result<()> {
        self.scripts.lock().unwrap().push(format!("{program} {}", args.join(" ")));
        Ok(())
    }
}

#[derive(Default)]
struct FakeReporter {
    stages: Mutex<Vec<Stage>>,
}

impl ErrorReporter for FakeReporter {
    fn register(&self, error: &DebugError) {
        self.stages.lock().unwrap().push(error.stage());
    }
}

struct Harness {
    compiler: Arc<FakeCompiler>,
    deployer: Arc<FakeDeployer>,
    terminal: Arc<FakeTerminal>,
    session: DebugSession,
}

impl Harness {
    fn new(compiler: FakeCompiler) -> Self {
        let compiler = Arc::new(compiler);
        let deployer = Arc::new(FakeDeployer::default());
        let terminal = Arc::new(FakeTerminal::default());
        let dispatcher: Arc<dyn CommandDispatcher> =
            Arc::new(TempFileDispatcher::new(terminal.clone()));
        let session = DebugSession::new(
            Config::default(),
            Toolchain::new(compiler.clone(), deployer.clone()),
            dispatcher,
        );
        Self { compiler, deployer, terminal, session }
    }
}

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn test_transfer_call_end_to_end() {
    hdb_common::logging::ensure_test_logging(None);
    info!("Running test");

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "A.src", "#define macro MAIN() = takes(0) returns(0) {}\n");

    let harness = Harness::new(FakeCompiler::default());
    let request = DebugRequest::new(dir.path(), "A.src").with_call(
        "a9059cbb",
        vec![
            Argument::new("address", "0x0000000000000000000000000000000000000001"),
            Argument::new("uint256", "100"),
        ],
    );

    let report = start_debugger(&harness.session, request, &FakeReporter::default())
        .await
        .expect("session should launch");

    let expected_calldata = format!(
        "0xa9059cbb{:0>64}{:0>64}",
        "1",
        "64" // 100
    );
    assert_eq!(report.calldata.as_ref().map(|c| c.as_str()), Some(expected_calldata.as_str()));
    assert_eq!(report.contract_address, contract_address(Path::new("A.src")));
    assert_eq!(report.runtime_bytecode.as_str(), RUNTIME);

    let config = BuildConfig::new(&Config::default(), Path::new("A.src"), true);
    let command_file = config.command_file(dir.path());
    assert_eq!(report.dispatch, Dispatch::CommandFile(command_file.clone()));

    let persisted = fs::read_to_string(&command_file).unwrap();
    assert!(persisted.starts_with("hevm exec --code "));
    assert!(persisted.contains(RUNTIME));
    assert!(persisted.contains(&format_address(&contract_address(Path::new("A.src")))));
    assert!(persisted.contains(&format!("--calldata {expected_calldata}")));
    assert!(persisted.contains("--state "));

    assert_eq!(
        *harness.terminal.scripts.lock().unwrap(),
        vec![format!("`cat {}`", command_file.display())]
    );
    assert_eq!(harness.deployer.deployed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_imports_are_flattened_in_order() {
    hdb_common::logging::ensure_test_logging(None);
    info!("Running test");

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/lib/One.huff", "#define macro ONE() = {}");
    write(dir.path(), "src/lib/Two.huff", "#define macro TWO() = {}");
    write(
        dir.path(),
        "src/Main.huff",
        "#include \"./lib/One.huff\"\n#include \"./lib/Two.huff\"\n#define macro MAIN() = {}",
    );

    let harness = Harness::new(FakeCompiler::default());
    let request = DebugRequest::new(dir.path(), "src/Main.huff").with_imports(vec![
        "#include \"./lib/One.huff\"".into(),
        "#include \"./lib/Two.huff\"".into(),
    ]);

    let report = harness.session.run(request).await.unwrap();
    assert!(report.calldata.is_none());
    assert!(!report.command.to_shell_string().contains("--calldata"));

    let sources = harness.compiler.sources.lock().unwrap();
    assert_eq!(
        sources.as_slice(),
        ["#define macro ONE() = {}\n#define macro TWO() = {}\n\n\n#define macro MAIN() = {}"]
    );
}

#[tokio::test]
async fn test_missing_import_stops_before_compiling() {
    hdb_common::logging::ensure_test_logging(None);
    info!("Running test");

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "A.huff", "#include \"./Missing.huff\"\n");

    let harness = Harness::new(FakeCompiler::default());
    let reporter = FakeReporter::default();
    let request =
        DebugRequest::new(dir.path(), "A.huff").with_imports(vec!["./Missing.huff".into()]);

    assert!(start_debugger(&harness.session, request, &reporter).await.is_none());
    assert_eq!(*reporter.stages.lock().unwrap(), vec![Stage::Flatten]);
    assert!(harness.compiler.sources.lock().unwrap().is_empty());
    assert!(harness.terminal.scripts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_argument_is_an_encode_failure() {
    hdb_common::logging::ensure_test_logging(None);
    info!("Running test");

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "A.huff", "#define macro MAIN() = {}");

    let harness = Harness::new(FakeCompiler::default());
    let request = DebugRequest::new(dir.path(), "A.huff")
        .with_call("a9059cbb", vec![Argument::new("uint256", "not-a-number")]);

    let err = harness.session.run(request).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Encode);
    assert!(harness.compiler.sources.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_compile_failure_skips_deploy_and_launch() {
    hdb_common::logging::ensure_test_logging(None);
    info!("Running test");

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "A.huff", "#define macro MAIN() = {}");

    let harness = Harness::new(FakeCompiler { fail: true, ..Default::default() });
    let err = harness.session.run(DebugRequest::new(dir.path(), "A.huff")).await.unwrap_err();

    assert!(matches!(err, DebugError::Compile(_)));
    assert!(harness.deployer.deployed.lock().unwrap().is_empty());
    assert!(harness.terminal.scripts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_tool_writes_nothing() {
    hdb_common::logging::ensure_test_logging(None);
    info!("Running test");

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "A.huff", "#define macro MAIN() = {}");

    let terminal = Arc::new(FakeTerminal::default());
    let session = DebugSession::new(
        Config::default(),
        Toolchain::new(
            Arc::new(Huffc::new("hdb-missing-huffc-7d1e")),
            Arc::new(Hevm::new("hdb-missing-hevm-7d1e")),
        ),
        Arc::new(TempFileDispatcher::new(terminal.clone())),
    );
    let reporter = FakeReporter::default();

    let request = DebugRequest::new(dir.path(), "A.huff").with_call("a9059cbb", vec![]);
    assert!(start_debugger(&session, request, &reporter).await.is_none());

    assert_eq!(*reporter.stages.lock().unwrap(), vec![Stage::Environment]);
    assert!(!dir.path().join("cache").exists());
    assert!(terminal.scripts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_direct_dispatch_without_state() {
    hdb_common::logging::ensure_test_logging(None);
    info!("Running test");

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "A.huff", "#define macro MAIN() = {}");

    let mut harness = Harness::new(FakeCompiler::default());
    harness.session = harness
        .session
        .clone()
        .with_dispatcher(Arc::new(DirectDispatcher::new(harness.terminal.clone())));

    let request = DebugRequest::new(dir.path(), "A.huff")
        .with_call("0x18160ddd", vec![])
        .with_options(hdb_engine::DebugOptions { state: false });

    let report = harness.session.run(request).await.unwrap();
    assert_eq!(report.dispatch, Dispatch::Direct);
    assert_eq!(report.calldata.map(|c| c.to_string()).as_deref(), Some("0x18160ddd"));
    assert_eq!(*harness.deployer.deployed.lock().unwrap(), vec![(
        Bytecode::from_tool_output("0x600b8060093d393df3").unwrap(),
        false
    )]);

    let scripts = harness.terminal.scripts.lock().unwrap();
    assert_eq!(scripts.len(), 1);
    assert!(!scripts[0].contains("--state"));
    assert!(!dir.path().join("cache").exists());
}
