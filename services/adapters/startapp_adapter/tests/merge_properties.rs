//! Preference Merge Property Tests
//!
//! Properties that must hold for any combination of local and server extras:
//! a well-formed server value always wins, a malformed one never erases a local
//! value, and merging never panics on arbitrary input.

use proptest::prelude::*;
use startapp_adapter::{
    keys, merge, merge_with_diagnostics, ImageSize, InterstitialMode, LocalExtras, RemoteExtras,
};

fn mode_strategy() -> impl Strategy<Value = InterstitialMode> {
    prop::sample::select(InterstitialMode::ALL.to_vec())
}

fn size_strategy() -> impl Strategy<Value = ImageSize> {
    prop::sample::select(ImageSize::ALL.to_vec())
}

fn remote(pairs: Vec<(&str, String)>) -> RemoteExtras {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

proptest! {
    #[test]
    fn prop_valid_remote_values_win(
        local_tag in "[a-z]{1,12}",
        remote_tag in "[a-z]{1,12}",
        local_cpm in 0.0f64..100.0,
        remote_cpm in 0.0f64..100.0,
        local_mode in mode_strategy(),
        remote_mode in mode_strategy(),
        local_size in size_strategy(),
        remote_size in size_strategy(),
    ) {
        let local = LocalExtras::builder()
            .ad_tag(local_tag)
            .min_cpm(local_cpm)
            .interstitial_mode(local_mode)
            .native_image_size(local_size)
            .build();
        let remote = remote(vec![
            (keys::AD_TAG, remote_tag.clone()),
            (keys::MIN_CPM, remote_cpm.to_string()),
            (keys::INTERSTITIAL_MODE, remote_mode.name().to_string()),
            (keys::NATIVE_IMAGE_SIZE, remote_size.name().to_string()),
        ]);

        let (pref, issues) = merge_with_diagnostics(&local, &remote, true);
        prop_assert!(issues.is_empty());
        prop_assert_eq!(pref.ad_tag(), Some(remote_tag.as_str()));
        prop_assert_eq!(pref.min_cpm(), Some(remote_cpm));
        prop_assert_eq!(pref.interstitial_mode(), Some(remote_mode));
        prop_assert_eq!(pref.primary_image_size(), Some(remote_size.ordinal()));
    }

    #[test]
    fn prop_absent_remote_keeps_local(
        local_tag in "[a-z]{1,12}",
        local_cpm in 0.0f64..100.0,
        local_mode in mode_strategy(),
        mute in any::<bool>(),
    ) {
        let mut builder = LocalExtras::builder()
            .ad_tag(local_tag.clone())
            .min_cpm(local_cpm)
            .interstitial_mode(local_mode);
        if mute {
            builder = builder.mute_video();
        }

        let pref = merge(&builder.build(), &RemoteExtras::new(), false);
        prop_assert_eq!(pref.ad_tag(), Some(local_tag.as_str()));
        prop_assert_eq!(pref.min_cpm(), Some(local_cpm));
        prop_assert_eq!(pref.interstitial_mode(), Some(local_mode));
        prop_assert_eq!(pref.mute_video(), mute.then_some(true));
    }

    #[test]
    fn prop_unparseable_cpm_keeps_local(
        local_cpm in 0.0f64..100.0,
        garbage in "[a-zA-Z ]{1,8}",
    ) {
        let local = LocalExtras::builder().min_cpm(local_cpm).build();
        let remote = remote(vec![(keys::MIN_CPM, garbage)]);

        let (pref, issues) = merge_with_diagnostics(&local, &remote, false);
        prop_assert_eq!(pref.min_cpm(), Some(local_cpm));
        prop_assert_eq!(issues.len(), 1);
    }

    #[test]
    fn prop_remote_boolean_is_substring_match(value in "[a-z]{1,10}") {
        let remote = remote(vec![(keys::MUTE_VIDEO, value.clone())]);
        let pref = merge(&LocalExtras::new(), &remote, false);
        prop_assert_eq!(pref.mute_video(), Some(value.contains("true")));
    }

    #[test]
    fn prop_merge_is_total(
        entries in prop::collection::hash_map(
            prop::sample::select(vec![
                keys::AD_TAG,
                keys::INTERSTITIAL_MODE,
                keys::MIN_CPM,
                keys::MUTE_VIDEO,
                keys::IS_3D_BANNER,
                keys::NATIVE_IMAGE_SIZE,
                keys::NATIVE_SECONDARY_IMAGE_SIZE,
                keys::APP_ID,
                keys::LOCATION,
            ]),
            ".{0,16}",
            0..9,
        ),
        is_native in any::<bool>(),
    ) {
        let remote: RemoteExtras = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let pref = merge(&LocalExtras::new(), &remote, is_native);
        prop_assert_eq!(pref.is_native(), is_native);
        if let Some(cpm) = pref.min_cpm() {
            prop_assert!(cpm.is_finite() && cpm >= 0.0);
        }
        prop_assert!(pref.location().is_none());
    }
}
