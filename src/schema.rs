//! Fixed data contracts: raw file layouts, event codes, and device vocabularies
//!
//! Both input files arrive headerless, so column meaning is positional. The
//! constants here are the single source of truth for those positions and for
//! the closed categorical vocabularies used during encoding.

/// Positional column names of the raw session-event file.
pub const SESSION_COLUMNS: [&str; 25] = [
    "sessionid",
    "category",
    "imageurl",
    "createddate",
    "pagetitle",
    "pageurl",
    "userid",
    "fullurl",
    "providerid",
    "productid",
    "normalizedpageurl",
    "rawpageurl",
    "referrerurl",
    "rawreferrerurl",
    "utmsource",
    "utmmedium",
    "utmcontent",
    "utmcampaign",
    "utmterm",
    "ipaddress",
    "deviceid",
    "requesttype",
    "eventtype",
    "quantity",
    "price",
];

/// Session columns never consumed downstream, pruned during cleaning.
pub const PRUNED_SESSION_COLUMNS: [&str; 13] = [
    "imageurl",
    "pageurl",
    "fullurl",
    "normalizedpageurl",
    "rawpageurl",
    "rawreferrerurl",
    "utmsource",
    "utmmedium",
    "utmcontent",
    "utmcampaign",
    "utmterm",
    "ipaddress",
    "requesttype",
];

/// Positional column names of the raw device file.
pub const DEVICE_COLUMNS: [&str; 11] = [
    "deviceid",
    "devicecategory",
    "devicetype",
    "agenttype",
    "os",
    "osversion",
    "useragent",
    "providerid",
    "createddate",
    "userid",
    "authtype",
];

/// Device columns never consumed downstream, ignored by the join.
pub const PRUNED_DEVICE_COLUMNS: [&str; 5] = [
    "osversion",
    "useragent",
    "providerid",
    "createddate",
    "authtype",
];

/// Event-type codes paired with their readable names. The names become
/// indicator column labels during encoding.
pub const EVENT_TYPES: [(i64, &str); 8] = [
    (-1, "Delete from Wishlist"),
    (1, "Page View"),
    (3, "Add to Cart"),
    (4, "Add to Wishlist"),
    (6, "Purchase"),
    (7, "Remove from Cart"),
    (8, "Add to Watchlist"),
    (104, "Begin Checkout"),
];

/// Reference event excluded from the event indicator expansion, along with
/// every lag variant of it.
pub const BASELINE_EVENT: &str = "Add to Watchlist";

/// Day names indexed by days-from-Monday.
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Reference day excluded from the day-of-week indicator expansion.
pub const BASELINE_DAY: &str = "Monday";

pub const HOURS_PER_DAY: i64 = 24;

/// Reference hour excluded from the hour indicator expansion.
pub const BASELINE_HOUR: i64 = 0;

/// Closed vocabulary for the device category attribute.
pub const DEVICE_CATEGORIES: [&str; 9] = [
    "iPhone",
    "Windows PC",
    "Android phone",
    "Mac",
    "iPad",
    "Linux PC",
    "Android PC",
    "Android tablet",
    "Windows phone",
];

/// Closed vocabulary for the device type attribute.
pub const DEVICE_TYPES: [&str; 3] = ["Smartphone", "Personal computer", "Tablet"];

/// Closed vocabulary for the agent type attribute.
pub const AGENT_TYPES: [&str; 2] = ["Mobile Browser", "Browser"];

/// Closed vocabulary for the operating system attribute.
pub const OS_NAMES: [&str; 5] = ["iOS", "Android", "Windows", "OS X", "Linux"];

/// Fallback for a device attribute present in the device file but outside
/// its closed vocabulary.
pub const OTHER: &str = "Other";

/// Fallback for session rows with no matching device record. Kept distinct
/// from [`OTHER`] so the two situations stay distinguishable upstream of
/// encoding.
pub const UNKNOWN: &str = "Unknown";

/// Event-type value standing in for "no event" at a sequence boundary.
/// Rows still carrying it after lag derivation are filtered out.
pub const SENTINEL_EVENT: i64 = 0;
