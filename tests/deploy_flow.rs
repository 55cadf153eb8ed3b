//! Deployment utility against a scripted compiler and wallet.

mod common;

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::SolCall;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{FakeWallet, CONTRACT};
use split_donate::contract::{builtin_abi, ContractHandle, ISplitDonation};
use split_donate::deploy::{self, CompiledContract, Compiler, DeployError, DeployPlan};

const DEPLOYER: Address = address!("90f8bf6a479f320ead074411a4b0e7944ea8c9c1");
const CONFIGURER: Address = address!("ffcf8fdee72ac11b5c542428b35eef5769c409f0");

#[derive(Default)]
struct FakeCompiler {
    diagnostics: Option<String>,
    runs: AtomicUsize,
}

impl Compiler for FakeCompiler {
    fn compile(&self, _source: &Path, _name: &str) -> Result<CompiledContract, DeployError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(diag) = &self.diagnostics {
            return Err(DeployError::Compile(diag.clone()));
        }
        Ok(CompiledContract {
            abi: builtin_abi(),
            bytecode: Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52]),
        })
    }
}

fn plan(numerator: u64, denominator: u64) -> DeployPlan {
    DeployPlan {
        deployer: DEPLOYER,
        configurer: CONFIGURER,
        numerator: U256::from(numerator),
        denominator: U256::from(denominator),
        gas_limit: None,
        gas_headroom_percent: 20,
    }
}

async fn run(
    compiler: &FakeCompiler,
    wallet: &FakeWallet,
    plan: &DeployPlan,
    artifact: Option<&Path>,
) -> Result<deploy::Deployment, DeployError> {
    deploy::run(
        compiler,
        wallet,
        Path::new("contract/SplitDonation.sol"),
        "SplitDonation",
        plan,
        artifact,
    )
    .await
}

#[tokio::test]
async fn configures_only_after_deployment_is_mined() {
    let compiler = FakeCompiler::default();
    let wallet = FakeWallet::default();

    let deployment = run(&compiler, &wallet, &plan(7, 100), None).await.unwrap();
    assert_eq!(deployment.handle.address, CONTRACT);
    assert_ne!(deployment.deploy_tx, deployment.configure_tx);

    assert_eq!(
        wallet.log(),
        vec![
            "estimate_gas",
            "send_transaction",
            "wait_for_receipt",
            "send_transaction",
            "wait_for_receipt",
        ]
    );

    let sent = wallet.sent();
    assert_eq!(sent[0].from, DEPLOYER);
    assert_eq!(sent[0].to, None);
    assert_eq!(&sent[0].data[..], &[0x60u8, 0x80, 0x60, 0x40, 0x52][..]);
    // 1_000_000 estimated plus 20%
    assert_eq!(sent[0].gas, Some(U256::from(1_200_000u64)));

    assert_eq!(sent[1].from, CONFIGURER);
    assert_eq!(sent[1].to, Some(CONTRACT));
    let call =
        ISplitDonation::setNumeratorAndDenominatorCall::abi_decode(&sent[1].data, true).unwrap();
    assert_eq!(call.numerator, U256::from(7u64));
    assert_eq!(call.denominator, U256::from(100u64));
}

#[tokio::test]
async fn fixed_gas_limit_skips_estimation() {
    let compiler = FakeCompiler::default();
    let wallet = FakeWallet::default();
    let plan = DeployPlan {
        gas_limit: Some(1_500_000),
        ..plan(1, 3)
    };

    run(&compiler, &wallet, &plan, None).await.unwrap();
    assert!(!wallet.log().contains(&"estimate_gas"));
    assert_eq!(wallet.sent()[0].gas, Some(U256::from(1_500_000u64)));
}

#[tokio::test]
async fn configuration_failure_reports_the_deployed_address() {
    let compiler = FakeCompiler::default();

    let wallet = FakeWallet {
        reject_configure: true,
        ..Default::default()
    };
    match run(&compiler, &wallet, &plan(7, 100), None).await {
        Err(DeployError::Configuration { address, reason }) => {
            assert_eq!(address, CONTRACT);
            assert!(reason.contains("sender account not recognized"));
        }
        other => panic!("expected configuration error, got {:?}", other.map(|d| d.handle)),
    }

    let wallet = FakeWallet {
        revert_configure: true,
        ..Default::default()
    };
    assert!(matches!(
        run(&compiler, &wallet, &plan(7, 100), None).await,
        Err(DeployError::Configuration { address, .. }) if address == CONTRACT
    ));
}

#[tokio::test]
async fn zero_denominator_is_rejected_before_compiling() {
    let compiler = FakeCompiler::default();
    let wallet = FakeWallet::default();

    assert!(matches!(
        run(&compiler, &wallet, &plan(1, 0), None).await,
        Err(DeployError::InvalidRatio(_))
    ));
    assert_eq!(compiler.runs.load(Ordering::SeqCst), 0);
    assert!(wallet.log().is_empty());
}

#[tokio::test]
async fn compiler_diagnostics_pass_through_verbatim() {
    let diag = "ParserError: Expected ';' but got '}'\n --> contract/SplitDonation.sol:9:5:";
    let compiler = FakeCompiler {
        diagnostics: Some(diag.to_string()),
        ..Default::default()
    };
    let wallet = FakeWallet::default();

    match run(&compiler, &wallet, &plan(7, 100), None).await {
        Err(DeployError::Compile(msg)) => assert_eq!(msg, diag),
        other => panic!("expected compile error, got {:?}", other.map(|d| d.handle)),
    }
    assert!(wallet.log().is_empty());
}

#[tokio::test]
async fn artifact_round_trips_into_a_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deployment.json");
    let compiler = FakeCompiler::default();
    let wallet = FakeWallet::default();

    let deployment = run(&compiler, &wallet, &plan(7, 100), Some(&path))
        .await
        .unwrap();
    let loaded = ContractHandle::load(&path).unwrap();
    assert_eq!(loaded, deployment.handle);
}

#[tokio::test]
async fn unwritable_artifact_still_reports_the_deployed_address() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("deployment.json");
    let compiler = FakeCompiler::default();
    let wallet = FakeWallet::default();

    let err = run(&compiler, &wallet, &plan(7, 100), Some(&path))
        .await
        .unwrap_err();
    assert!(err.to_string().contains(&CONTRACT.to_string()), "{}", err);
    match err {
        DeployError::Artifact { address, reason } => {
            assert_eq!(address, CONTRACT);
            assert!(reason.contains("failed to write"), "{}", reason);
        }
        other => panic!("expected artifact error, got {:?}", other),
    }
    // both transactions went out before the write was attempted
    assert_eq!(wallet.sent().len(), 2);
}

#[test]
fn bundled_source_keeps_the_donation_with_the_payee() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("contract/SplitDonation.sol");
    let source = std::fs::read_to_string(path).unwrap();

    for method in split_donate::contract::REQUIRED_METHODS {
        assert!(source.contains(method), "source lacks `{}`", method);
    }
    assert!(source.contains("toPayee = (msg.value * numerator[payee]) / denominator[payee]"));
    assert!(source.contains("toDonee = msg.value - toPayee"));
}
