// Races against the compare-and-swap seam: concurrent engine calls must all
// land through the retry loop, and raw stale writes must lose exactly once.

use futures::future::join_all;
use std::sync::Arc;

use boardroom::{
    ArchiveOutcome, GovernanceEngine, MemoryStore, NewProject, PrincipalId, ProjectId,
    ProjectStore, RemovalOutcome, RetryPolicy,
};

/// Engine with a deep retry budget so every racer is guaranteed to land.
fn racing_engine() -> Arc<GovernanceEngine<MemoryStore>> {
    Arc::new(GovernanceEngine::with_retry(
        MemoryStore::new(),
        RetryPolicy {
            max_attempts: 25,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(10),
            jitter: true,
        },
    ))
}

fn principal(raw: &str) -> PrincipalId {
    PrincipalId::new(raw).unwrap()
}

async fn project_with_admins(
    engine: &GovernanceEngine<MemoryStore>,
    admins: &[&str],
) -> ProjectId {
    let project = engine
        .create_project(
            &principal("olive"),
            NewProject {
                name: "race fixture".to_string(),
                seed_members: admins.iter().map(|raw| principal(raw)).collect(),
                ..NewProject::default()
            },
        )
        .await
        .unwrap();
    for admin in admins {
        engine
            .promote_to_admin(&principal("olive"), project.id(), &principal(admin))
            .await
            .unwrap();
    }
    project.id()
}

#[tokio::test]
async fn two_writers_from_the_same_revision_land_exactly_one_save_each() {
    let store = MemoryStore::new();
    let project = store
        .insert_project(
            boardroom::Project::new(
                principal("olive"),
                NewProject {
                    name: "cas fixture".to_string(),
                    ..NewProject::default()
                },
                chrono::Utc::now(),
            )
            .unwrap(),
        )
        .await
        .unwrap();

    // Both copies carry revision 1; the second save must be refused.
    let left = store.load_project(project.id()).await.unwrap();
    let right = store.load_project(project.id()).await.unwrap();

    let winner = store.save_project(left).await;
    let loser = store.save_project(right).await;
    assert!(winner.is_ok());
    assert!(loser.unwrap_err().is_revision_conflict());

    let stored = store.load_project(project.id()).await.unwrap();
    assert_eq!(stored.revision(), 2);
}

#[tokio::test]
async fn concurrent_archive_approvals_converge_on_a_single_completion() {
    let engine = racing_engine();
    let id = project_with_admins(&engine, &["ana", "ben", "casey", "dana"]).await;

    engine
        .initiate_archive(&principal("olive"), id)
        .await
        .unwrap();

    // All four remaining admins approve at once. Every call must land via
    // the replay loop, and exactly one of them observes the completion.
    let voters = ["ana", "ben", "casey", "dana"];
    let outcomes = join_all(voters.iter().map(|voter| {
        let engine = Arc::clone(&engine);
        let voter = principal(voter);
        async move { engine.approve_archive(&voter, id).await }
    }))
    .await;

    let mut completions = 0;
    for outcome in outcomes {
        let (_, outcome) = outcome.unwrap();
        if outcome == ArchiveOutcome::Archived {
            completions += 1;
        }
    }
    assert_eq!(completions, 1);

    let project = engine.project(id).await.unwrap();
    assert!(project.archive().is_archived());
}

#[tokio::test]
async fn concurrent_removal_approvals_demote_the_target_exactly_once() {
    let engine = racing_engine();
    let id = project_with_admins(&engine, &["ana", "ben", "casey", "dana"]).await;
    let target = principal("dana");

    engine
        .initiate_admin_removal(&principal("ana"), id, &target)
        .await
        .unwrap();

    let voters = ["olive", "ben", "casey"];
    let outcomes = join_all(voters.iter().map(|voter| {
        let engine = Arc::clone(&engine);
        let voter = principal(voter);
        let target = target.clone();
        async move { engine.approve_admin_removal(&voter, id, &target).await }
    }))
    .await;

    // The round needed four approvals (five admins, target excluded); ana's
    // initiation plus these three reach quorum, so exactly one replayed vote
    // observes the demotion and the others land as interim approvals.
    let mut demotions = 0;
    for outcome in outcomes {
        match outcome {
            Ok((_, RemovalOutcome::Demoted)) => demotions += 1,
            Ok((_, RemovalOutcome::Pending { .. })) => {}
            Ok((_, RemovalOutcome::Cancelled)) => panic!("nobody rejected"),
            Err(err) => panic!("vote failed: {err}"),
        }
    }
    assert_eq!(demotions, 1);

    let project = engine.project(id).await.unwrap();
    assert_eq!(
        project.role_of(&target),
        Some(boardroom::Role::Member)
    );
    assert!(project.removal_request(&target).is_none());
}

#[tokio::test]
async fn unrelated_concurrent_mutations_all_commit_through_replay() {
    let engine = racing_engine();
    let id = project_with_admins(&engine, &["ana"]).await;

    // Ten member additions race against one project document.
    let joiners: Vec<String> = (0..10).map(|n| format!("member{n}")).collect();
    let results = join_all(joiners.iter().map(|joiner| {
        let engine = Arc::clone(&engine);
        let joiner = principal(joiner);
        async move { engine.add_member(&principal("olive"), id, &joiner).await }
    }))
    .await;
    for result in results {
        result.unwrap();
    }

    let project = engine.project(id).await.unwrap();
    // owner + ana + ten joiners
    assert_eq!(project.roster().len(), 12);
    assert_eq!(project.revision(), 12);
}
