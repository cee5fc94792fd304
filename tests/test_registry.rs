//! Profile → service list wiring, checked through the public API.

use std::collections::HashSet;

use edge_appliance::profile::Profile;
use edge_appliance::supervisor::registry;

#[cfg(all(feature = "service-ela", feature = "service-eva", feature = "service-eda"))]
#[test]
fn every_profile_resolves_in_a_full_build() {
    for profile in Profile::ALL {
        let entries = registry::services_for(profile).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name).collect();
        assert_eq!(names, profile.service_names());
    }
}

#[test]
fn profile_lists_have_exact_lengths() {
    assert_eq!(Profile::Cni.service_names().len(), 2);
    assert_eq!(Profile::Nts.service_names().len(), 3);
}

#[test]
fn profile_lists_have_no_duplicates() {
    for profile in Profile::ALL {
        let names = profile.service_names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len(), "duplicate service in {profile}");
    }
}

#[test]
fn dataplane_agent_is_exclusive_to_nts() {
    let cni: HashSet<_> = Profile::Cni.service_names().iter().copied().collect();
    let nts: HashSet<_> = Profile::Nts.service_names().iter().copied().collect();
    let only_nts: Vec<_> = nts.difference(&cni).copied().collect();
    assert_eq!(only_nts, vec!["eda"]);
    assert!(cni.is_subset(&nts));
}

#[test]
fn every_compiled_service_belongs_to_some_profile() {
    let known: HashSet<_> = Profile::ALL
        .iter()
        .flat_map(|p| p.service_names().iter().copied())
        .collect();
    for entry in registry::compiled() {
        assert!(known.contains(entry.name), "{} is not used by any profile", entry.name);
    }
}
