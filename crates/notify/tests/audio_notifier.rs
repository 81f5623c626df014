use kanshi_core::alert::entity::Urgency;
use kanshi_core::notify::entity::{ToneProfile, Waveform};
use kanshi_core::notify::port::AlertNotifier;
use kanshi_core::test_utils::RecordingTonePlayer;
use kanshi_notify::audio::AudioNotifier;
use kanshi_notify::player::NullTonePlayer;
use std::sync::Arc;
use std::time::Duration;

const TONE: Duration = Duration::from_secs(15);

fn notifier() -> (AudioNotifier, Arc<RecordingTonePlayer>) {
    let player = Arc::new(RecordingTonePlayer::new());
    (AudioNotifier::new(player.clone(), TONE, false), player)
}

#[tokio::test(start_paused = true)]
async fn test_alert_plays_profile_for_urgency() {
    let (notifier, player) = notifier();

    assert!(notifier.alert(Urgency::Critical).await);
    assert!(notifier.is_sounding());
    assert_eq!(player.resumes(), 1);
    assert_eq!(player.played(), vec![ToneProfile::for_urgency(Urgency::Critical)]);
    assert_eq!(player.played()[0].waveform, Waveform::Square);
}

#[tokio::test(start_paused = true)]
async fn test_second_alert_is_dropped_while_sounding() {
    let (notifier, player) = notifier();

    assert!(notifier.alert(Urgency::Normal).await);
    assert!(!notifier.alert(Urgency::Critical).await);
    assert_eq!(player.played().len(), 1);
    assert_eq!(player.resumes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tone_stops_after_duration() {
    let (notifier, player) = notifier();
    assert!(notifier.alert(Urgency::Overnight).await);

    tokio::time::sleep(TONE - Duration::from_millis(100)).await;
    assert!(notifier.is_sounding());
    assert_eq!(player.stops(), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!notifier.is_sounding());
    assert_eq!(player.stops(), 1);

    // 闸门已释放，可以再次提醒
    assert!(notifier.alert(Urgency::Normal).await);
}

#[tokio::test(start_paused = true)]
async fn test_resume_failure_releases_gate() {
    let (notifier, player) = notifier();
    player.set_fail_resume(true);

    assert!(!notifier.alert(Urgency::Critical).await);
    assert!(!notifier.is_sounding());
    assert!(player.played().is_empty());

    player.set_fail_resume(false);
    assert!(notifier.alert(Urgency::Critical).await);
    assert_eq!(player.resumes(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_play_failure_releases_gate() {
    let (notifier, player) = notifier();
    player.set_fail_play(true);

    assert!(!notifier.alert(Urgency::Normal).await);
    assert!(!notifier.is_sounding());

    player.set_fail_play(false);
    assert!(notifier.alert(Urgency::Normal).await);
}

#[tokio::test(start_paused = true)]
async fn test_muted_alert_never_touches_device() {
    let (notifier, player) = notifier();
    notifier.set_muted(true);

    assert!(notifier.is_muted());
    assert!(!notifier.alert(Urgency::Critical).await);
    assert_eq!(player.resumes(), 0);

    assert!(!notifier.toggle_mute());
    assert!(notifier.alert(Urgency::Critical).await);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent_and_cancels_timer() {
    let (notifier, player) = notifier();
    assert!(notifier.alert(Urgency::Normal).await);

    notifier.stop().await;
    notifier.stop().await;
    assert!(!notifier.is_sounding());
    assert_eq!(player.stops(), 1);

    // 被取消的定时停止不会再次触发
    tokio::time::sleep(TONE * 2).await;
    assert_eq!(player.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_timer_does_not_cut_new_tone() {
    let (notifier, player) = notifier();
    assert!(notifier.alert(Urgency::Normal).await);

    tokio::time::sleep(Duration::from_secs(5)).await;
    notifier.stop().await;
    assert!(notifier.alert(Urgency::Critical).await);

    // 第一个提醒音原定在 15 秒停止，新提醒音应持续到 20 秒
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(notifier.is_sounding());
    assert_eq!(player.stops(), 1);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!notifier.is_sounding());
    assert_eq!(player.stops(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_start_does_not_cut_next_tone() {
    let player = Arc::new(RecordingTonePlayer::new());
    let gate = player.gate_next_resume();
    let notifier = AudioNotifier::new(player.clone(), TONE, false);

    let starting = tokio::spawn({
        let notifier = notifier.clone();
        async move { notifier.alert(Urgency::Normal).await }
    });
    while player.resumes() == 0 {
        tokio::task::yield_now().await;
    }

    let stopping = tokio::spawn({
        let notifier = notifier.clone();
        async move { notifier.stop().await }
    });
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
    // 启动尚未完成时的新提醒直接丢弃，不会抢到闸门
    assert!(!notifier.alert(Urgency::Critical).await);

    gate.notify_one();
    assert!(!starting.await.unwrap());
    stopping.await.unwrap();
    assert!(!notifier.is_sounding());
    assert_eq!(player.stops(), 1);

    assert!(notifier.alert(Urgency::Critical).await);
    tokio::time::sleep(TONE - Duration::from_secs(1)).await;
    assert!(notifier.is_sounding());
    assert_eq!(player.stops(), 1);
    assert_eq!(
        player.played().last(),
        Some(&ToneProfile::for_urgency(Urgency::Critical))
    );
}

#[tokio::test(start_paused = true)]
async fn test_toggle_mute_flips_state() {
    let (notifier, _player) = notifier();
    assert!(notifier.toggle_mute());
    assert!(notifier.is_muted());
    assert!(!notifier.toggle_mute());
    assert!(!notifier.is_muted());
}

#[tokio::test(start_paused = true)]
async fn test_muting_silences_current_tone() {
    let (notifier, player) = notifier();
    assert!(notifier.alert(Urgency::Critical).await);

    notifier.set_muted(true);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(!notifier.is_sounding());
    assert_eq!(player.stops(), 1);
}

#[tokio::test]
async fn test_null_player_accepts_alerts() {
    let notifier = AudioNotifier::new(Arc::new(NullTonePlayer), TONE, false);
    assert!(notifier.alert(Urgency::Normal).await);
    notifier.stop().await;
    assert!(!notifier.is_sounding());
}
