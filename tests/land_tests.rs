//! End-to-end land runs against real repositories with a local bare origin.

mod common;

use common::{git, land_options, Fixture};

use runway::engine::{LandOptions, Strategy};
use runway::error::{as_land_error, LandError};

#[test]
fn test_squash_land_updates_remote_and_prunes_branch() {
    let fixture = Fixture::new().unwrap();
    let initial = fixture.resolve("master").unwrap();

    // An unrelated branch that must survive the operation untouched.
    git(&fixture.clone, &["branch", "release", "master"]);
    let release = fixture.resolve("release").unwrap();

    fixture
        .branch_with_commit("feature1", "feature.txt", "Add feature")
        .unwrap();
    fixture.commit_file("feature2.txt", "Refine feature").unwrap();

    fixture
        .land(land_options(&["feature1"]), Some("Add the feature"))
        .unwrap();

    // The remote moved to a single squash commit on top of the old tip.
    let landed = fixture.resolve_origin("master").unwrap();
    assert_ne!(landed, initial);
    let parents = git(&fixture.clone, &["log", "-n1", "--format=%P", &landed]);
    assert_eq!(parents, initial);
    let message = git(&fixture.clone, &["log", "-n1", "--format=%s", &landed]);
    assert_eq!(message, "Add the feature");

    // The consumed branch is gone, master fast-forwarded and checked out.
    assert!(fixture.resolve("refs/heads/feature1").is_none());
    assert_eq!(fixture.resolve("master").unwrap(), landed);
    assert_eq!(fixture.current_branch().as_deref(), Some("master"));

    // The unrelated branch did not move.
    assert_eq!(fixture.resolve("release").unwrap(), release);
}

#[test]
fn test_squash_preserves_original_author() {
    let fixture = Fixture::new().unwrap();

    git(&fixture.clone, &["checkout", "-b", "feature1"]);
    git(
        &fixture.clone,
        &["branch", "--set-upstream-to=origin/master", "feature1"],
    );
    std::fs::write(fixture.clone.join("feature.txt"), "change\n").unwrap();
    git(&fixture.clone, &["add", "."]);
    git(
        &fixture.clone,
        &[
            "commit",
            "--author",
            "Alice Author <alice@example.com>",
            "-m",
            "Add feature",
        ],
    );

    fixture.land(land_options(&["feature1"]), None).unwrap();

    let landed = fixture.resolve_origin("master").unwrap();
    let author = git(&fixture.clone, &["log", "-n1", "--format=%an <%ae>", &landed]);
    assert_eq!(author, "Alice Author <alice@example.com>");

    // Without an explicit message, the newest commit's message is reused.
    let message = git(&fixture.clone, &["log", "-n1", "--format=%s", &landed]);
    assert_eq!(message, "Add feature");
}

#[test]
fn test_merge_strategy_keeps_both_parents() {
    let fixture = Fixture::new().unwrap();
    let initial = fixture.resolve("master").unwrap();

    fixture
        .branch_with_commit("feature1", "feature.txt", "Add feature")
        .unwrap();
    let tip = fixture.resolve("feature1").unwrap();

    let options = LandOptions {
        strategy: Some(Strategy::Merge),
        ..land_options(&["feature1"])
    };
    fixture.land(options, Some("Merge the feature")).unwrap();

    let landed = fixture.resolve_origin("master").unwrap();
    let parents = git(&fixture.clone, &["log", "-n1", "--format=%P", &landed]);
    let parents: Vec<&str> = parents.split_whitespace().collect();
    assert_eq!(parents, vec![initial.as_str(), tip.as_str()]);
}

#[test]
fn test_second_run_is_a_no_op() {
    let fixture = Fixture::new().unwrap();

    fixture
        .branch_with_commit("feature1", "feature.txt", "Add feature")
        .unwrap();
    fixture.land(land_options(&["feature1"]), None).unwrap();
    let landed = fixture.resolve_origin("master").unwrap();

    // The run ended on master, which now matches the remote exactly.
    let err = fixture.land(land_options(&[]), None).unwrap_err();
    assert!(matches!(as_land_error(&err), Some(LandError::NoOp(_))));

    assert_eq!(fixture.resolve_origin("master").unwrap(), landed);
    assert_eq!(fixture.resolve("master").unwrap(), landed);
    assert_eq!(fixture.current_branch().as_deref(), Some("master"));
}

#[test]
fn test_empty_diff_refuses_without_side_effects() {
    let fixture = Fixture::new().unwrap();

    fixture
        .branch_with_commit("feature1", "feature.txt", "Add feature")
        .unwrap();
    let tip = fixture.resolve("feature1").unwrap();

    // The same change reaches master independently: the branch's commit is
    // still unreachable from the target, but integrating it adds nothing.
    git(&fixture.clone, &["checkout", "master"]);
    git(&fixture.clone, &["cherry-pick", &tip]);
    git(&fixture.clone, &["push", "origin", "master"]);
    let pushed = fixture.resolve_origin("master").unwrap();
    git(&fixture.clone, &["checkout", "feature1"]);

    let err = fixture.land(land_options(&["feature1"]), None).unwrap_err();
    assert!(matches!(as_land_error(&err), Some(LandError::NoOp(_))));

    // Nothing moved: branch intact, remote untouched, checkout restored.
    assert_eq!(fixture.resolve("feature1").unwrap(), tip);
    assert_eq!(fixture.resolve_origin("master").unwrap(), pushed);
    assert_eq!(fixture.current_branch().as_deref(), Some("feature1"));
}

#[test]
fn test_conflict_rolls_back_to_starting_state() {
    let fixture = Fixture::new().unwrap();

    fixture
        .branch_with_commit("feature1", "shared.txt", "Feature version")
        .unwrap();
    let tip = fixture.resolve("feature1").unwrap();

    // A conflicting change lands on master first.
    git(&fixture.clone, &["checkout", "master"]);
    fixture
        .commit_file("shared.txt", "Conflicting master version")
        .unwrap();
    git(&fixture.clone, &["push", "origin", "master"]);
    let pushed = fixture.resolve_origin("master").unwrap();
    git(&fixture.clone, &["checkout", "feature1"]);

    let err = fixture.land(land_options(&["feature1"]), None).unwrap_err();
    assert!(matches!(as_land_error(&err), Some(LandError::Conflict(_))));

    // The rollback left no merge in progress and restored the checkout.
    assert_eq!(fixture.current_branch().as_deref(), Some("feature1"));
    assert_eq!(fixture.resolve("feature1").unwrap(), tip);
    assert_eq!(git(&fixture.clone, &["status", "--porcelain"]), "");
    assert_eq!(fixture.resolve_origin("master").unwrap(), pushed);
}

#[test]
fn test_cascade_rebases_dependent_branch() {
    let fixture = Fixture::new().unwrap();

    fixture
        .branch_with_commit("feature1", "one.txt", "First change")
        .unwrap();
    git(&fixture.clone, &["checkout", "-b", "feature2"]);
    fixture.commit_file("two.txt", "Second change").unwrap();
    git(&fixture.clone, &["checkout", "feature1"]);

    fixture.land(land_options(&["feature1"]), None).unwrap();

    let landed = fixture.resolve_origin("master").unwrap();

    // feature1 was consumed; feature2 now sits directly on the landed state.
    assert!(fixture.resolve("refs/heads/feature1").is_none());
    let feature2 = fixture.resolve("feature2").unwrap();
    let parent = git(&fixture.clone, &["log", "-n1", "--format=%P", &feature2]);
    assert_eq!(parent, landed);
    assert_eq!(fixture.resolve("master").unwrap(), landed);
}

#[test]
fn test_multiple_tracking_remotes_fail_before_any_mutation() {
    let fixture = Fixture::new().unwrap();
    let initial = fixture.resolve_origin("master").unwrap();

    let second = fixture.origin.parent().unwrap().join("second.git");
    git(
        fixture.origin.parent().unwrap(),
        &["init", "--bare", "-b", "master", "second.git"],
    );
    git(
        &fixture.clone,
        &["remote", "add", "second", second.to_str().unwrap()],
    );
    git(&fixture.clone, &["push", "second", "master"]);

    fixture
        .branch_with_commit("feature1", "one.txt", "First change")
        .unwrap();
    git(&fixture.clone, &["checkout", "master"]);
    git(&fixture.clone, &["checkout", "-b", "feature2"]);
    git(
        &fixture.clone,
        &["branch", "--set-upstream-to=second/master", "feature2"],
    );
    fixture.commit_file("two.txt", "Second change").unwrap();

    let err = fixture
        .land(land_options(&["feature1", "feature2"]), None)
        .unwrap_err();
    assert!(matches!(as_land_error(&err), Some(LandError::Config(_))));
    assert!(err.to_string().contains("--onto-remote"));

    // The failure happened during resolution: branches and remotes intact.
    assert!(fixture.resolve("refs/heads/feature1").is_some());
    assert!(fixture.resolve("refs/heads/feature2").is_some());
    assert_eq!(fixture.resolve_origin("master").unwrap(), initial);
}

#[test]
fn test_into_empty_creates_new_root() {
    let fixture = Fixture::new().unwrap();

    fixture
        .branch_with_commit("feature1", "feature.txt", "Seed new history")
        .unwrap();

    let options = LandOptions {
        onto: vec!["newtrunk".to_string()],
        into_empty: true,
        ..land_options(&["feature1"])
    };
    fixture.land(options, Some("Seed new history")).unwrap();

    // The published commit is a root: no parents at all.
    let landed = fixture.resolve_origin("newtrunk").unwrap();
    let parents = git(&fixture.clone, &["log", "-n1", "--format=%P", &landed]);
    assert_eq!(parents, "");

    // The old history was not disturbed.
    assert!(fixture.resolve_origin("master").is_some());
}

#[test]
fn test_hold_integrates_without_publishing() {
    let fixture = Fixture::new().unwrap();
    let initial = fixture.resolve_origin("master").unwrap();

    fixture
        .branch_with_commit("feature1", "feature.txt", "Add feature")
        .unwrap();
    let tip = fixture.resolve("feature1").unwrap();

    let options = LandOptions {
        hold: true,
        ..land_options(&["feature1"])
    };
    fixture.land(options, None).unwrap();

    // Nothing was pushed and nothing was destroyed.
    assert_eq!(fixture.resolve_origin("master").unwrap(), initial);
    assert_eq!(fixture.resolve("feature1").unwrap(), tip);

    // The integration commit exists locally, on a detached HEAD.
    assert_eq!(fixture.current_branch(), None);
    let head = fixture.resolve("HEAD").unwrap();
    let parents = git(&fixture.clone, &["log", "-n1", "--format=%P", &head]);
    assert_eq!(parents, initial);
}

#[test]
fn test_perforce_mode_rejects_merge_strategy_before_mutation() {
    let fixture = Fixture::new().unwrap();
    let initial = fixture.resolve_origin("master").unwrap();

    fixture
        .branch_with_commit("feature1", "feature.txt", "Add feature")
        .unwrap();
    let tip = fixture.resolve("feature1").unwrap();

    // A git-p4 bridge working copy: tracking refs under refs/remotes/p4/
    // with no configured remote URL.
    let head = fixture.resolve("master").unwrap();
    git(
        &fixture.clone,
        &["update-ref", "refs/remotes/p4/master", &head],
    );

    let options = LandOptions {
        onto_remote: Some("p4".to_string()),
        strategy: Some(Strategy::Merge),
        ..land_options(&["feature1"])
    };
    let err = fixture.land(options, None).unwrap_err();
    assert!(matches!(as_land_error(&err), Some(LandError::Config(_))));
    assert!(err.to_string().contains("squash"));

    // Rejected during resolution: nothing moved.
    assert_eq!(fixture.resolve("feature1").unwrap(), tip);
    assert_eq!(fixture.resolve_origin("master").unwrap(), initial);
    assert_eq!(fixture.current_branch().as_deref(), Some("feature1"));
}

#[test]
fn test_landing_two_symbols_publishes_both() {
    let fixture = Fixture::new().unwrap();
    let initial = fixture.resolve("master").unwrap();

    // Two independent branches, each rooted at master.
    fixture
        .branch_with_commit("feature1", "one.txt", "First feature")
        .unwrap();
    git(&fixture.clone, &["checkout", "master"]);
    fixture
        .branch_with_commit("feature2", "two.txt", "Second feature")
        .unwrap();

    fixture
        .land(land_options(&["feature1", "feature2"]), None)
        .unwrap();

    // The published tree carries both changes.
    let landed = fixture.resolve_origin("master").unwrap();
    let tree = git(&fixture.clone, &["ls-tree", "--name-only", &landed]);
    let files: Vec<&str> = tree.lines().collect();
    assert!(files.contains(&"one.txt"));
    assert!(files.contains(&"two.txt"));

    // Two squash commits, one per symbol, in symbol order on top of the old
    // tip, each keeping its own branch's message.
    let first = git(&fixture.clone, &["log", "-n1", "--format=%P", &landed]);
    assert_eq!(
        git(&fixture.clone, &["log", "-n1", "--format=%P", &first]),
        initial
    );
    assert_eq!(
        git(&fixture.clone, &["log", "-n1", "--format=%s", &first]),
        "First feature"
    );
    assert_eq!(
        git(&fixture.clone, &["log", "-n1", "--format=%s", &landed]),
        "Second feature"
    );

    // Both consumed branches are gone.
    assert!(fixture.resolve("refs/heads/feature1").is_none());
    assert!(fixture.resolve("refs/heads/feature2").is_none());
    assert_eq!(fixture.resolve("master").unwrap(), landed);
}

#[test]
fn test_restores_starting_branch_when_no_branch_tracks_target() {
    let fixture = Fixture::new().unwrap();

    git(&fixture.clone, &["branch", "stable", "master"]);
    git(&fixture.clone, &["push", "origin", "stable"]);
    let old_stable = fixture.resolve_origin("stable").unwrap();

    fixture
        .branch_with_commit("feature1", "feature.txt", "Add feature")
        .unwrap();

    // The run starts on an unrelated branch with no upstream; no local
    // branch tracks origin/stable, so there is nothing to fast-forward.
    git(&fixture.clone, &["checkout", "master"]);
    git(&fixture.clone, &["checkout", "-b", "workbench"]);
    let workbench = fixture.resolve("workbench").unwrap();

    let options = LandOptions {
        onto: vec!["stable".to_string()],
        ..land_options(&["feature1"])
    };
    fixture.land(options, None).unwrap();

    // The land published, then put the user back where they started instead
    // of leaving a detached HEAD.
    assert_ne!(fixture.resolve_origin("stable").unwrap(), old_stable);
    assert_eq!(fixture.current_branch().as_deref(), Some("workbench"));
    assert_eq!(fixture.resolve("workbench").unwrap(), workbench);
    assert_eq!(git(&fixture.clone, &["status", "--porcelain"]), "");
}

#[test]
fn test_cascade_conflict_rolls_back_to_starting_state() {
    let fixture = Fixture::new().unwrap();

    fixture
        .branch_with_commit("feature1", "a.txt", "Add base work")
        .unwrap();
    let feature1 = fixture.resolve("feature1").unwrap();

    // A dependent branch whose change will collide with master.
    git(&fixture.clone, &["checkout", "-b", "feature2"]);
    fixture.commit_file("b.txt", "Dependent version").unwrap();
    let feature2 = fixture.resolve("feature2").unwrap();

    git(&fixture.clone, &["checkout", "master"]);
    fixture.commit_file("b.txt", "Master version").unwrap();
    git(&fixture.clone, &["push", "origin", "master"]);
    let pushed = fixture.resolve_origin("master").unwrap();
    git(&fixture.clone, &["checkout", "feature1"]);

    // feature1 integrates cleanly, but cascading feature2 onto the landed
    // state conflicts on b.txt.
    let err = fixture.land(land_options(&["feature1"]), None).unwrap_err();
    assert!(matches!(as_land_error(&err), Some(LandError::Conflict(_))));
    assert!(err.to_string().contains("feature2"));

    // No rebase left in progress, nothing destroyed, nothing published, and
    // the checkout is back where it started.
    assert!(!fixture.clone.join(".git/rebase-merge").exists());
    assert!(!fixture.clone.join(".git/rebase-apply").exists());
    assert_eq!(fixture.current_branch().as_deref(), Some("feature1"));
    assert_eq!(fixture.resolve("feature1").unwrap(), feature1);
    assert_eq!(fixture.resolve("feature2").unwrap(), feature2);
    assert_eq!(git(&fixture.clone, &["status", "--porcelain"]), "");
    assert_eq!(fixture.resolve_origin("master").unwrap(), pushed);
}

#[test]
fn test_onto_flag_beats_tracking_inference() {
    let fixture = Fixture::new().unwrap();

    // A second target branch in the remote.
    git(&fixture.clone, &["branch", "stable", "master"]);
    git(&fixture.clone, &["push", "origin", "stable"]);
    let stable = fixture.resolve_origin("stable").unwrap();
    let master = fixture.resolve_origin("master").unwrap();

    fixture
        .branch_with_commit("feature1", "feature.txt", "Add feature")
        .unwrap();

    let options = LandOptions {
        onto: vec!["stable".to_string()],
        ..land_options(&["feature1"])
    };
    fixture.land(options, None).unwrap();

    // Only stable moved, even though feature1 tracks master.
    assert_ne!(fixture.resolve_origin("stable").unwrap(), stable);
    assert_eq!(fixture.resolve_origin("master").unwrap(), master);
}
